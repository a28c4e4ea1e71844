//! Graph identities, labels, relation types and mirrored node properties.

use std::fmt;

use checklist_model::{NomRelType, Rank};
use serde::{Deserialize, Serialize};

/// Stable identity of a staged node. Never reused after deletion and the
/// only key shared by the graph and the payload store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Node labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Name,
    Taxon,
    Synonym,
    Basionym,
    Root,
}

impl Label {
    pub const ALL: [Label; 5] = [
        Label::Name,
        Label::Taxon,
        Label::Synonym,
        Label::Basionym,
        Label::Root,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Name => "NAME",
            Label::Taxon => "TAXON",
            Label::Synonym => "SYNONYM",
            Label::Basionym => "BASIONYM",
            Label::Root => "ROOT",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label set of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Labels(u8);

impl Labels {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, label: Label) -> bool {
        self.0 & label.bit() != 0
    }

    pub fn insert(&mut self, label: Label) {
        self.0 |= label.bit();
    }

    pub fn remove(&mut self, label: Label) {
        self.0 &= !label.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Label> {
        Label::ALL.into_iter().filter(move |label| self.contains(*label))
    }
}

impl FromIterator<Label> for Labels {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        let mut labels = Labels::empty();
        for label in iter {
            labels.insert(label);
        }
        labels
    }
}

impl From<&[Label]> for Labels {
    fn from(labels: &[Label]) -> Self {
        labels.iter().copied().collect()
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|label| label.as_str()).collect();
        f.write_str(&names.join(":"))
    }
}

/// Edge types. Nomenclatural edges run from the later name to the earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelType {
    /// Parent taxon to child taxon.
    ParentOf,
    /// Synonym to accepted taxon.
    SynonymOf,
    HasBasionym,
    SpellingCorrectionOf,
    BasedOn,
    ReplacementNameOf,
    ConservedAgainst,
    LaterHomonymOf,
    SuperfluousName,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::ParentOf => "PARENT_OF",
            RelType::SynonymOf => "SYNONYM_OF",
            RelType::HasBasionym => "HAS_BASIONYM",
            RelType::SpellingCorrectionOf => "SPELLING_CORRECTION_OF",
            RelType::BasedOn => "BASED_ON",
            RelType::ReplacementNameOf => "REPLACEMENT_NAME_OF",
            RelType::ConservedAgainst => "CONSERVED_AGAINST",
            RelType::LaterHomonymOf => "LATER_HOMONYM_OF",
            RelType::SuperfluousName => "SUPERFLUOUS_NAME",
        }
    }

    /// Domain relation type of a nomenclatural edge.
    pub fn nom_rel_type(&self) -> Option<NomRelType> {
        match self {
            RelType::ParentOf | RelType::SynonymOf => None,
            RelType::HasBasionym => Some(NomRelType::Basionym),
            RelType::SpellingCorrectionOf => Some(NomRelType::SpellingCorrection),
            RelType::BasedOn => Some(NomRelType::BasedOn),
            RelType::ReplacementNameOf => Some(NomRelType::ReplacementName),
            RelType::ConservedAgainst => Some(NomRelType::Conserved),
            RelType::LaterHomonymOf => Some(NomRelType::LaterHomonym),
            RelType::SuperfluousName => Some(NomRelType::Superfluous),
        }
    }

    pub fn from_nom_rel_type(rel: NomRelType) -> Self {
        match rel {
            NomRelType::Basionym => RelType::HasBasionym,
            NomRelType::SpellingCorrection => RelType::SpellingCorrectionOf,
            NomRelType::BasedOn => RelType::BasedOn,
            NomRelType::ReplacementName => RelType::ReplacementNameOf,
            NomRelType::Conserved => RelType::ConservedAgainst,
            NomRelType::LaterHomonym => RelType::LaterHomonymOf,
            NomRelType::Superfluous => RelType::SuperfluousName,
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Small indexed properties mirrored from the payload onto the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProps {
    pub id: Option<String>,
    pub scientific_name: Option<String>,
    pub canonical_name: Option<String>,
    pub rank: Option<Rank>,
    pub authorship: Option<String>,
    /// Name still awaiting completion by relation resolution.
    pub provisional: bool,
}

/// A typed edge between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub start: NodeId,
    pub rel: RelType,
    pub end: NodeId,
    /// Only meaningful on `SYNONYM_OF` edges.
    pub homotypic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_set_operations() {
        let mut labels = Labels::from(&[Label::Name, Label::Taxon][..]);
        assert!(labels.contains(Label::Taxon));
        assert!(!labels.contains(Label::Synonym));
        labels.remove(Label::Taxon);
        labels.insert(Label::Synonym);
        assert_eq!(labels.to_string(), "NAME:SYNONYM");
        assert_eq!(labels.iter().count(), 2);
    }

    #[test]
    fn test_nomenclatural_rel_types_round_trip() {
        assert_eq!(RelType::ParentOf.nom_rel_type(), None);
        assert_eq!(RelType::SynonymOf.nom_rel_type(), None);
        for rel in [
            RelType::HasBasionym,
            RelType::SpellingCorrectionOf,
            RelType::BasedOn,
            RelType::ReplacementNameOf,
            RelType::ConservedAgainst,
            RelType::LaterHomonymOf,
            RelType::SuperfluousName,
        ] {
            let nom = rel.nom_rel_type().unwrap();
            assert_eq!(RelType::from_nom_rel_type(nom), rel);
        }
    }
}
