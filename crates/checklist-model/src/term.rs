//! Controlled vocabulary of field terms.
//!
//! Source files are described by column headers that map onto terms of a
//! versioned vocabulary. Class terms name a whole table (a row type),
//! property terms name a single column. The registry is built once and
//! handed to readers explicitly; there is no process-wide registration.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace prefix of the Annual Checklist Exchange Format vocabulary.
pub const ACEF_PREFIX: &str = "acef";

/// Terms of the Annual Checklist Exchange Format (ACEF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AcefTerm {
    // === Class terms ===
    AcceptedSpecies,
    AcceptedInfraSpecificTaxa,
    Synonyms,
    CommonNames,
    Distribution,
    Reference,
    NameReferencesLinks,
    SourceDatabase,

    // === Usage properties ===
    AcceptedTaxonID,
    ID,
    ParentSpeciesID,
    Kingdom,
    Phylum,
    Class,
    Order,
    Superfamily,
    Family,
    Genus,
    SubGenusName,
    SpeciesEpithet,
    AuthorString,
    InfraSpeciesEpithet,
    InfraSpeciesMarker,
    InfraSpeciesAuthorString,
    Sp2000NameStatus,
    GSDNameStatus,
    IsFossil,
    HasPreHolocene,
    IsRecent,
    HasModern,
    LifeZone,
    AdditionalData,
    LTSSpecialist,
    LTSDate,
    SpeciesURL,
    InfraSpeciesURL,
    GSDTaxonGUI,
    GSDNameGUI,

    // === Reference properties ===
    ReferenceID,
    Author,
    Year,
    Title,
    Details,
    ReferenceType,

    // === Distribution properties ===
    DistributionElement,
    StandardInUse,
    DistributionStatus,

    // === Common name properties ===
    CommonName,
    TransliteratedName,
    Language,
    Country,
    Area,

    // === Source database properties ===
    DatabaseFullName,
    DatabaseShortName,
    DatabaseVersion,
    ReleaseDate,
    AuthorsEditors,
    TaxonomicCoverage,
    GroupNameInEnglish,
    Abstract,
    Organisation,
    HomeURL,
    Coverage,
    Completeness,
    Confidence,
    ContactPerson,
}

impl AcefTerm {
    /// Every term of the vocabulary, class terms first.
    pub const ALL: &'static [AcefTerm] = &[
        AcefTerm::AcceptedSpecies,
        AcefTerm::AcceptedInfraSpecificTaxa,
        AcefTerm::Synonyms,
        AcefTerm::CommonNames,
        AcefTerm::Distribution,
        AcefTerm::Reference,
        AcefTerm::NameReferencesLinks,
        AcefTerm::SourceDatabase,
        AcefTerm::AcceptedTaxonID,
        AcefTerm::ID,
        AcefTerm::ParentSpeciesID,
        AcefTerm::Kingdom,
        AcefTerm::Phylum,
        AcefTerm::Class,
        AcefTerm::Order,
        AcefTerm::Superfamily,
        AcefTerm::Family,
        AcefTerm::Genus,
        AcefTerm::SubGenusName,
        AcefTerm::SpeciesEpithet,
        AcefTerm::AuthorString,
        AcefTerm::InfraSpeciesEpithet,
        AcefTerm::InfraSpeciesMarker,
        AcefTerm::InfraSpeciesAuthorString,
        AcefTerm::Sp2000NameStatus,
        AcefTerm::GSDNameStatus,
        AcefTerm::IsFossil,
        AcefTerm::HasPreHolocene,
        AcefTerm::IsRecent,
        AcefTerm::HasModern,
        AcefTerm::LifeZone,
        AcefTerm::AdditionalData,
        AcefTerm::LTSSpecialist,
        AcefTerm::LTSDate,
        AcefTerm::SpeciesURL,
        AcefTerm::InfraSpeciesURL,
        AcefTerm::GSDTaxonGUI,
        AcefTerm::GSDNameGUI,
        AcefTerm::ReferenceID,
        AcefTerm::Author,
        AcefTerm::Year,
        AcefTerm::Title,
        AcefTerm::Details,
        AcefTerm::ReferenceType,
        AcefTerm::DistributionElement,
        AcefTerm::StandardInUse,
        AcefTerm::DistributionStatus,
        AcefTerm::CommonName,
        AcefTerm::TransliteratedName,
        AcefTerm::Language,
        AcefTerm::Country,
        AcefTerm::Area,
        AcefTerm::DatabaseFullName,
        AcefTerm::DatabaseShortName,
        AcefTerm::DatabaseVersion,
        AcefTerm::ReleaseDate,
        AcefTerm::AuthorsEditors,
        AcefTerm::TaxonomicCoverage,
        AcefTerm::GroupNameInEnglish,
        AcefTerm::Abstract,
        AcefTerm::Organisation,
        AcefTerm::HomeURL,
        AcefTerm::Coverage,
        AcefTerm::Completeness,
        AcefTerm::Confidence,
        AcefTerm::ContactPerson,
    ];

    /// Returns the term name exactly as it appears in ACEF headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            AcefTerm::AcceptedSpecies => "AcceptedSpecies",
            AcefTerm::AcceptedInfraSpecificTaxa => "AcceptedInfraSpecificTaxa",
            AcefTerm::Synonyms => "Synonyms",
            AcefTerm::CommonNames => "CommonNames",
            AcefTerm::Distribution => "Distribution",
            AcefTerm::Reference => "Reference",
            AcefTerm::NameReferencesLinks => "NameReferencesLinks",
            AcefTerm::SourceDatabase => "SourceDatabase",
            AcefTerm::AcceptedTaxonID => "AcceptedTaxonID",
            AcefTerm::ID => "ID",
            AcefTerm::ParentSpeciesID => "ParentSpeciesID",
            AcefTerm::Kingdom => "Kingdom",
            AcefTerm::Phylum => "Phylum",
            AcefTerm::Class => "Class",
            AcefTerm::Order => "Order",
            AcefTerm::Superfamily => "Superfamily",
            AcefTerm::Family => "Family",
            AcefTerm::Genus => "Genus",
            AcefTerm::SubGenusName => "SubGenusName",
            AcefTerm::SpeciesEpithet => "SpeciesEpithet",
            AcefTerm::AuthorString => "AuthorString",
            AcefTerm::InfraSpeciesEpithet => "InfraSpeciesEpithet",
            AcefTerm::InfraSpeciesMarker => "InfraSpeciesMarker",
            AcefTerm::InfraSpeciesAuthorString => "InfraSpeciesAuthorString",
            AcefTerm::Sp2000NameStatus => "Sp2000NameStatus",
            AcefTerm::GSDNameStatus => "GSDNameStatus",
            AcefTerm::IsFossil => "IsFossil",
            AcefTerm::HasPreHolocene => "HasPreHolocene",
            AcefTerm::IsRecent => "IsRecent",
            AcefTerm::HasModern => "HasModern",
            AcefTerm::LifeZone => "LifeZone",
            AcefTerm::AdditionalData => "AdditionalData",
            AcefTerm::LTSSpecialist => "LTSSpecialist",
            AcefTerm::LTSDate => "LTSDate",
            AcefTerm::SpeciesURL => "SpeciesURL",
            AcefTerm::InfraSpeciesURL => "InfraSpeciesURL",
            AcefTerm::GSDTaxonGUI => "GSDTaxonGUI",
            AcefTerm::GSDNameGUI => "GSDNameGUI",
            AcefTerm::ReferenceID => "ReferenceID",
            AcefTerm::Author => "Author",
            AcefTerm::Year => "Year",
            AcefTerm::Title => "Title",
            AcefTerm::Details => "Details",
            AcefTerm::ReferenceType => "ReferenceType",
            AcefTerm::DistributionElement => "DistributionElement",
            AcefTerm::StandardInUse => "StandardInUse",
            AcefTerm::DistributionStatus => "DistributionStatus",
            AcefTerm::CommonName => "CommonName",
            AcefTerm::TransliteratedName => "TransliteratedName",
            AcefTerm::Language => "Language",
            AcefTerm::Country => "Country",
            AcefTerm::Area => "Area",
            AcefTerm::DatabaseFullName => "DatabaseFullName",
            AcefTerm::DatabaseShortName => "DatabaseShortName",
            AcefTerm::DatabaseVersion => "DatabaseVersion",
            AcefTerm::ReleaseDate => "ReleaseDate",
            AcefTerm::AuthorsEditors => "AuthorsEditors",
            AcefTerm::TaxonomicCoverage => "TaxonomicCoverage",
            AcefTerm::GroupNameInEnglish => "GroupNameInEnglish",
            AcefTerm::Abstract => "Abstract",
            AcefTerm::Organisation => "Organisation",
            AcefTerm::HomeURL => "HomeURL",
            AcefTerm::Coverage => "Coverage",
            AcefTerm::Completeness => "Completeness",
            AcefTerm::Confidence => "Confidence",
            AcefTerm::ContactPerson => "ContactPerson",
        }
    }

    /// Returns true for terms naming a whole table rather than a column.
    pub fn is_class(&self) -> bool {
        matches!(
            self,
            AcefTerm::AcceptedSpecies
                | AcefTerm::AcceptedInfraSpecificTaxa
                | AcefTerm::Synonyms
                | AcefTerm::CommonNames
                | AcefTerm::Distribution
                | AcefTerm::Reference
                | AcefTerm::NameReferencesLinks
                | AcefTerm::SourceDatabase
        )
    }
}

/// A vocabulary term, either known or an explicit placeholder for a header
/// that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Acef(AcefTerm),
    Unknown {
        prefix: Option<String>,
        name: String,
        class: bool,
    },
}

impl Term {
    /// Creates a placeholder for an unresolved name, splitting off a
    /// `prefix:` namespace when present.
    pub fn unknown(qualified: &str, class: bool) -> Self {
        match qualified.split_once(':') {
            Some((prefix, name)) if !prefix.is_empty() && !name.is_empty() => Term::Unknown {
                prefix: Some(prefix.to_string()),
                name: name.to_string(),
                class,
            },
            _ => Term::Unknown {
                prefix: None,
                name: qualified.to_string(),
                class,
            },
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        match self {
            Term::Acef(_) => Some(ACEF_PREFIX),
            Term::Unknown { prefix, .. } => prefix.as_deref(),
        }
    }

    pub fn simple_name(&self) -> &str {
        match self {
            Term::Acef(term) => term.as_str(),
            Term::Unknown { name, .. } => name,
        }
    }

    /// Returns `prefix:name`, or the bare name when the term has no namespace.
    pub fn qualified_name(&self) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}:{}", self.simple_name()),
            None => self.simple_name().to_string(),
        }
    }

    pub fn is_class(&self) -> bool {
        match self {
            Term::Acef(term) => term.is_class(),
            Term::Unknown { class, .. } => *class,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Term::Unknown { .. })
    }
}

impl From<AcefTerm> for Term {
    fn from(term: AcefTerm) -> Self {
        Term::Acef(term)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Lookup table from header spellings to vocabulary terms.
///
/// Names are matched case-insensitively, with or without their namespace
/// prefix. When two vocabularies share a simple name, the qualified
/// spelling stays unambiguous and the simple one resolves to the term
/// registered first.
#[derive(Debug, Clone, Default)]
pub struct TermRegistry {
    by_name: HashMap<String, Term>,
    terms: Vec<Term>,
}

impl TermRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the complete ACEF vocabulary.
    pub fn acef() -> Self {
        let mut registry = Self::new();
        for term in AcefTerm::ALL {
            registry.register(Term::Acef(*term));
        }
        registry
    }

    pub fn register(&mut self, term: Term) {
        let qualified = normalize_key(&term.qualified_name());
        let simple = normalize_key(term.simple_name());
        self.by_name.entry(simple).or_insert_with(|| term.clone());
        self.by_name.insert(qualified, term.clone());
        self.terms.push(term);
    }

    /// Resolves a header or file name to a registered term.
    ///
    /// With a `prefix`, the namespaced spelling `prefix:name` is tried
    /// before the plain one.
    pub fn find(&self, prefix: Option<&str>, name: &str) -> Option<&Term> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(prefix) = prefix
            && !name.contains(':')
            && let Some(term) = self.by_name.get(&normalize_key(&format!("{prefix}:{name}")))
        {
            return Some(term);
        }
        self.by_name.get(&normalize_key(name))
    }

    /// Like [`TermRegistry::find`] but only accepts class terms.
    pub fn find_class(&self, prefix: Option<&str>, name: &str) -> Option<&Term> {
        self.find(prefix, name).filter(|term| term.is_class())
    }

    /// Resolves a header cell to a property term, falling back to an
    /// unknown placeholder that keeps the original spelling.
    pub fn resolve_property(&self, prefix: Option<&str>, name: &str) -> Term {
        match self.find(prefix, name) {
            Some(term) if !term.is_class() => term.clone(),
            _ => Term::unknown(name.trim(), false),
        }
    }

    /// All class terms of the given namespace, in registration order.
    pub fn class_terms(&self, prefix: &str) -> Vec<Term> {
        self.terms
            .iter()
            .filter(|term| term.is_class() && term.prefix() == Some(prefix))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}
