//! Raw records as read from source files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::capability::HasIssues;
use crate::issue::IssueSet;
use crate::term::Term;

/// One logical row of a source file.
///
/// Values are already normalized by the reader: absent values are simply
/// missing from the map. The content is fixed at construction; afterwards
/// only issues can be attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    file: String,
    line: u64,
    row_type: Term,
    values: BTreeMap<Term, String>,
    issues: IssueSet,
}

impl RawRecord {
    pub fn new(
        file: impl Into<String>,
        line: u64,
        row_type: Term,
        values: BTreeMap<Term, String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            row_type,
            values,
            issues: IssueSet::new(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// One-based line number of the row within its file.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn row_type(&self) -> &Term {
        &self.row_type
    }

    pub fn get(&self, term: impl Into<Term>) -> Option<&str> {
        self.values.get(&term.into()).map(String::as_str)
    }

    /// Returns the first present value of the given terms.
    pub fn get_first<T: Into<Term> + Copy>(&self, terms: &[T]) -> Option<&str> {
        terms.iter().find_map(|term| self.get(*term))
    }

    pub fn has(&self, term: impl Into<Term>) -> bool {
        self.values.contains_key(&term.into())
    }

    pub fn values(&self) -> &BTreeMap<Term, String> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl HasIssues for RawRecord {
    fn issues(&self) -> &IssueSet {
        &self.issues
    }

    fn issues_mut(&mut self) -> &mut IssueSet {
        &mut self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Issue;
    use crate::term::AcefTerm;

    fn record() -> RawRecord {
        let mut values = BTreeMap::new();
        values.insert(Term::from(AcefTerm::Genus), "Abies".to_string());
        values.insert(Term::from(AcefTerm::SpeciesEpithet), "alba".to_string());
        RawRecord::new("AcceptedSpecies.txt", 2, AcefTerm::AcceptedSpecies.into(), values)
    }

    #[test]
    fn test_get_values() {
        let rec = record();
        assert_eq!(rec.get(AcefTerm::Genus), Some("Abies"));
        assert_eq!(rec.get(AcefTerm::Family), None);
        assert_eq!(
            rec.get_first(&[AcefTerm::SubGenusName, AcefTerm::SpeciesEpithet]),
            Some("alba")
        );
        assert!(rec.has(AcefTerm::Genus));
    }

    #[test]
    fn test_issues_accumulate() {
        let mut rec = record();
        rec.add_issue(Issue::PreviousLineSkipped);
        rec.add_issue(Issue::PreviousLineSkipped);
        rec.add_issue(Issue::NotInterpreted);
        assert_eq!(rec.issues().len(), 2);
        assert!(rec.has_issue(Issue::NotInterpreted));
    }
}
