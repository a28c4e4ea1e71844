//! Name usages: accepted taxa and synonyms.
//!
//! A usage wraps exactly one [`ParsedName`]. Whether it is a taxon or a
//! synonym is a tagged union that may flip during relation resolution;
//! the status stored in each variant always matches the variant's kind.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::capability::{HasIssues, VerbatimKey, impl_capabilities};
use crate::distribution::Distribution;
use crate::enums::Lifezone;
use crate::error::{ModelError, Result};
use crate::issue::{Issue, IssueSet};
use crate::name::ParsedName;
use crate::status::TaxonomicStatus;
use crate::vernacular::VernacularName;

/// Flat higher classification copied from the source record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    pub class: Option<String>,
    pub order: Option<String>,
    pub superfamily: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub subgenus: Option<String>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        *self == Classification::default()
    }
}

/// Data specific to accepted (or doubtful) usages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxon {
    status: TaxonomicStatus,
    /// Declared id of the parent usage, resolved into an edge later.
    pub parent_id: Option<String>,
    pub fossil: Option<bool>,
    pub recent: Option<bool>,
    pub lifezones: BTreeSet<Lifezone>,
    pub webpage: Option<String>,
    pub distributions: Vec<Distribution>,
    pub vernacular_names: Vec<VernacularName>,
}

impl Taxon {
    fn new(status: TaxonomicStatus) -> Self {
        Self {
            status,
            parent_id: None,
            fossil: None,
            recent: None,
            lifezones: BTreeSet::new(),
            webpage: None,
            distributions: Vec::new(),
            vernacular_names: Vec::new(),
        }
    }

    pub fn status(&self) -> TaxonomicStatus {
        self.status
    }

    /// Provisionally accepted or doubtful.
    pub fn is_provisional(&self) -> bool {
        matches!(
            self.status,
            TaxonomicStatus::ProvisionallyAccepted | TaxonomicStatus::Doubtful
        )
    }
}

/// Data specific to synonym usages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    status: TaxonomicStatus,
    /// Declared ids of the accepted usages. More than one for pro parte synonyms.
    pub accepted_ids: Vec<String>,
}

impl Synonym {
    fn new(status: TaxonomicStatus) -> Self {
        Self {
            status,
            accepted_ids: Vec::new(),
        }
    }

    pub fn status(&self) -> TaxonomicStatus {
        self.status
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageKind {
    Taxon(Taxon),
    Synonym(Synonym),
}

/// Business ids of related usages, filled when a usage is read together
/// with its graph relations. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageRelations {
    pub parent: Option<String>,
    pub accepted: Vec<String>,
    pub basionym: Option<String>,
}

/// A taxon or synonym together with its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameUsage {
    pub id: Option<String>,
    pub name: ParsedName,
    pub kind: UsageKind,
    pub according_to: Option<String>,
    pub according_to_date: Option<NaiveDate>,
    pub classification: Classification,
    /// Reference ids of the taxon bibliography.
    pub reference_ids: BTreeSet<String>,
    pub remarks: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
    pub issues: IssueSet,
    #[serde(skip)]
    pub relations: UsageRelations,
}

impl_capabilities!(NameUsage);

impl NameUsage {
    /// Creates an accepted usage. A synonym-kind status is replaced by
    /// `Doubtful` and flagged with `TAXONOMIC_STATUS_INVALID`.
    pub fn taxon(name: ParsedName, status: TaxonomicStatus) -> Self {
        let mut usage = Self::with_kind(name, UsageKind::Taxon(Taxon::new(TaxonomicStatus::Accepted)));
        usage.set_status(status);
        usage
    }

    /// Creates a synonym usage. An accepted-kind status is replaced by
    /// `Synonym` and flagged with `TAXONOMIC_STATUS_INVALID`.
    pub fn synonym(name: ParsedName, status: TaxonomicStatus) -> Self {
        let mut usage =
            Self::with_kind(name, UsageKind::Synonym(Synonym::new(TaxonomicStatus::Synonym)));
        usage.set_status(status);
        usage
    }

    fn with_kind(name: ParsedName, kind: UsageKind) -> Self {
        Self {
            id: name.id.clone(),
            name,
            kind,
            according_to: None,
            according_to_date: None,
            classification: Classification::default(),
            reference_ids: BTreeSet::new(),
            remarks: None,
            verbatim_key: None,
            issues: IssueSet::new(),
            relations: UsageRelations::default(),
        }
    }

    pub fn status(&self) -> TaxonomicStatus {
        match &self.kind {
            UsageKind::Taxon(taxon) => taxon.status,
            UsageKind::Synonym(synonym) => synonym.status,
        }
    }

    /// Assigns a status within the current variant.
    ///
    /// A status of the wrong kind is not accepted: the usage keeps its
    /// variant, receives the variant's fallback status and is flagged.
    pub fn set_status(&mut self, status: TaxonomicStatus) {
        let mismatch = match &mut self.kind {
            UsageKind::Taxon(taxon) if status.is_synonym() => {
                taxon.status = TaxonomicStatus::Doubtful;
                true
            }
            UsageKind::Taxon(taxon) => {
                taxon.status = status;
                false
            }
            UsageKind::Synonym(synonym) if !status.is_synonym() => {
                synonym.status = TaxonomicStatus::Synonym;
                true
            }
            UsageKind::Synonym(synonym) => {
                synonym.status = status;
                false
            }
        };
        if mismatch {
            self.add_issue(Issue::TaxonomicStatusInvalid);
        }
    }

    /// Turns this usage into a synonym with the given synonym-kind status.
    pub fn convert_to_synonym(&mut self, status: TaxonomicStatus) -> Result<()> {
        if !status.is_synonym() {
            return Err(ModelError::StatusKindMismatch {
                status,
                target: "synonym",
            });
        }
        match &mut self.kind {
            UsageKind::Synonym(synonym) => synonym.status = status,
            UsageKind::Taxon(taxon) => {
                let mut synonym = Synonym::new(status);
                synonym.accepted_ids.extend(taxon.parent_id.take());
                self.kind = UsageKind::Synonym(synonym);
            }
        }
        Ok(())
    }

    /// Turns this usage into a taxon with the given accepted-kind status.
    pub fn convert_to_taxon(&mut self, status: TaxonomicStatus) -> Result<()> {
        if status.is_synonym() {
            return Err(ModelError::StatusKindMismatch {
                status,
                target: "taxon",
            });
        }
        match &mut self.kind {
            UsageKind::Taxon(taxon) => taxon.status = status,
            UsageKind::Synonym(_) => self.kind = UsageKind::Taxon(Taxon::new(status)),
        }
        Ok(())
    }

    pub fn is_synonym(&self) -> bool {
        matches!(self.kind, UsageKind::Synonym(_))
    }

    pub fn as_taxon(&self) -> Option<&Taxon> {
        match &self.kind {
            UsageKind::Taxon(taxon) => Some(taxon),
            UsageKind::Synonym(_) => None,
        }
    }

    pub fn as_taxon_mut(&mut self) -> Option<&mut Taxon> {
        match &mut self.kind {
            UsageKind::Taxon(taxon) => Some(taxon),
            UsageKind::Synonym(_) => None,
        }
    }

    pub fn as_synonym(&self) -> Option<&Synonym> {
        match &self.kind {
            UsageKind::Synonym(synonym) => Some(synonym),
            UsageKind::Taxon(_) => None,
        }
    }

    pub fn as_synonym_mut(&mut self) -> Option<&mut Synonym> {
        match &mut self.kind {
            UsageKind::Synonym(synonym) => Some(synonym),
            UsageKind::Taxon(_) => None,
        }
    }

    /// Issues of the usage and its name together.
    pub fn all_issues(&self) -> IssueSet {
        self.issues.union(&self.name.issues).copied().collect()
    }
}
