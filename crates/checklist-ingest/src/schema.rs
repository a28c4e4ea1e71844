//! Schema of one discovered source file.

use std::path::{Path, PathBuf};

use checklist_model::Term;

use crate::encoding::Charset;
use crate::format::CsvFormat;

/// A mapped column, or a constant default when no column is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub term: Term,
    pub index: Option<usize>,
    pub default_value: Option<String>,
}

impl Field {
    pub fn column(term: Term, index: usize) -> Self {
        Self {
            term,
            index: Some(index),
            default_value: None,
        }
    }

    pub fn constant(term: Term, value: impl Into<String>) -> Self {
        Self {
            term,
            index: None,
            default_value: Some(value.into()),
        }
    }
}

/// Describes how to read one delimited file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub file: PathBuf,
    pub row_type: Term,
    pub charset: Charset,
    pub format: CsvFormat,
    pub columns: Vec<Field>,
}

impl Schema {
    pub fn field(&self, term: &Term) -> Option<&Field> {
        self.columns.iter().find(|field| &field.term == term)
    }

    pub fn has_term(&self, term: &Term) -> bool {
        self.field(term).is_some()
    }

    /// Highest column index referenced by any field.
    pub fn max_index(&self) -> Option<usize> {
        self.columns.iter().filter_map(|field| field.index).max()
    }

    pub fn unknown_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|field| field.term.is_unknown())
            .count()
    }

    pub fn file_name(&self) -> String {
        file_name(&self.file)
    }

    /// True when the file's base name spells the row type.
    pub fn file_matches_row_type(&self) -> bool {
        self.file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.eq_ignore_ascii_case(self.row_type.simple_name()))
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_model::AcefTerm;

    fn schema(file: &str) -> Schema {
        Schema {
            file: PathBuf::from(file),
            row_type: AcefTerm::Synonyms.into(),
            charset: Charset::Utf8,
            format: CsvFormat::default(),
            columns: vec![
                Field::column(AcefTerm::ID.into(), 0),
                Field::column(Term::unknown("Colour", false), 3),
                Field::constant(AcefTerm::Sp2000NameStatus.into(), "synonym"),
            ],
        }
    }

    #[test]
    fn test_max_index_and_unknowns() {
        let schema = schema("data/Synonyms.txt");
        assert_eq!(schema.max_index(), Some(3));
        assert_eq!(schema.unknown_count(), 1);
        assert!(schema.has_term(&AcefTerm::ID.into()));
        assert!(!schema.has_term(&AcefTerm::Genus.into()));
    }

    #[test]
    fn test_file_matches_row_type() {
        assert!(schema("data/synonyms.txt").file_matches_row_type());
        assert!(!schema("data/syn.txt").file_matches_row_type());
        assert_eq!(schema("data/syn.txt").file_name(), "syn.txt");
    }
}
