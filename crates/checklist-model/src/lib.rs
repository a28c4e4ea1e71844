//! Domain model for taxonomic checklist imports.
//!
//! Vocabulary terms, raw records, names, usages, references and the
//! issues that accumulate on them while a source is normalized.

pub mod capability;
pub mod distribution;
pub mod enums;
pub mod error;
pub mod issue;
pub mod metadata;
pub mod name;
pub mod rank;
pub mod record;
pub mod reference;
pub mod status;
pub mod term;
pub mod usage;
pub mod vernacular;

// === Vocabulary ===
pub use term::{ACEF_PREFIX, AcefTerm, Term, TermRegistry};

// === Records and capabilities ===
pub use capability::{HasIdentity, HasIssues, HasVerbatimProvenance, VerbatimKey};
pub use issue::{Issue, IssueSet};
pub use record::RawRecord;

// === Names and usages ===
pub use enums::{Lifezone, NomCode, NomRelType, Origin};
pub use name::{AtomizedNameParser, Authorship, NameAtoms, NameParser, ParsedName};
pub use rank::Rank;
pub use status::TaxonomicStatus;
pub use usage::{Classification, NameUsage, Synonym, Taxon, UsageKind, UsageRelations};

// === Attached data ===
pub use distribution::{Area, Distribution, DistributionStatus, Gazetteer};
pub use metadata::DatasetMetadata;
pub use reference::{CitationBuilder, Reference, ReferenceFactory, ReferenceLookup, ReferenceParts};
pub use vernacular::VernacularName;

pub use error::{ModelError, Result};
