//! Interpretation of ACEF records into domain objects.
//!
//! Functions here never write to the staging store. They read a raw
//! record, possibly consult already staged references, and return at most
//! one domain object. Data problems are added as issues to the record.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use checklist_model::name::brackets_balanced;
use checklist_model::{
    AcefTerm, Area, AtomizedNameParser, CitationBuilder, Classification, DatasetMetadata,
    Distribution, DistributionStatus, Gazetteer, HasIssues, Issue, IssueSet, Lifezone, NameAtoms,
    NameParser, NameUsage, NomCode, ParsedName, Rank, RawRecord, Reference, ReferenceFactory,
    ReferenceLookup, ReferenceParts, TaxonomicStatus, VerbatimKey, VernacularName,
};

/// Length at which authorship strings of the ACEF assembly database were cut.
pub const ACEF_AUTHOR_MAX: usize = 100;

/// Separators of multi-valued ACEF fields.
const MULTI_VALUE_SEPARATORS: [char; 3] = [';', '|', ','];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
];

/// Turns ACEF records into references, usages, distributions and
/// vernacular names.
pub struct AcefInterpreter {
    names: Box<dyn NameParser>,
    references: Box<dyn ReferenceFactory>,
    code: Option<NomCode>,
}

impl Default for AcefInterpreter {
    fn default() -> Self {
        Self::new(AtomizedNameParser, CitationBuilder)
    }
}

impl std::fmt::Debug for AcefInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcefInterpreter")
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

impl AcefInterpreter {
    pub fn new(
        names: impl NameParser + 'static,
        references: impl ReferenceFactory + 'static,
    ) -> Self {
        Self {
            names: Box::new(names),
            references: Box::new(references),
            code: None,
        }
    }

    /// Set the nomenclatural code applied to every name of the source.
    #[must_use]
    pub fn with_code(mut self, code: Option<NomCode>) -> Self {
        self.code = code;
        self
    }

    pub fn code(&self) -> Option<NomCode> {
        self.code
    }

    // === References ===

    pub fn interpret_reference(&self, record: &RawRecord) -> Option<Reference> {
        self.references.build(&ReferenceParts {
            id: record.get(AcefTerm::ReferenceID),
            authors: record.get(AcefTerm::Author),
            year: record.get(AcefTerm::Year),
            title: record.get(AcefTerm::Title),
            details: record.get(AcefTerm::Details),
        })
    }

    // === Usages ===

    /// Interprets an `AcceptedSpecies` row.
    pub fn interpret_species(&self, record: &mut RawRecord) -> Option<NameUsage> {
        self.interpret_usage(record, AcefTerm::AcceptedTaxonID, false)
    }

    /// Interprets an `AcceptedInfraSpecificTaxa` row.
    ///
    /// The returned usage carries a preliminary name. Its genus and species
    /// come from the parent species and are filled in during relation
    /// resolution.
    pub fn interpret_infraspecies(&self, record: &mut RawRecord) -> Option<NameUsage> {
        if !record.has(AcefTerm::ParentSpeciesID) {
            record.add_issue(Issue::ParentIdInvalid);
        }
        let mut usage = self.interpret_usage(record, AcefTerm::AcceptedTaxonID, false)?;
        if let Some(taxon) = usage.as_taxon_mut() {
            taxon.parent_id = record.get(AcefTerm::ParentSpeciesID).map(str::to_string);
        }
        Some(usage)
    }

    /// Interprets a `Synonyms` row.
    pub fn interpret_synonym(&self, record: &mut RawRecord) -> Option<NameUsage> {
        if !record.has(AcefTerm::AcceptedTaxonID) {
            record.add_issue(Issue::AcceptedIdInvalid);
        }
        let mut usage = self.interpret_usage(record, AcefTerm::ID, true)?;
        if let Some(synonym) = usage.as_synonym_mut() {
            synonym
                .accepted_ids
                .extend(record.get(AcefTerm::AcceptedTaxonID).map(str::to_string));
        }
        Some(usage)
    }

    fn interpret_usage(
        &self,
        record: &mut RawRecord,
        id_term: AcefTerm,
        synonym: bool,
    ) -> Option<NameUsage> {
        let name = self.interpret_name(record, id_term)?;
        let status = self.interpret_status(record, synonym);
        let mut usage = if synonym {
            NameUsage::synonym(name, status)
        } else {
            NameUsage::taxon(name, status)
        };
        if usage.has_issue(Issue::TaxonomicStatusInvalid) {
            tracing::debug!(
                file = record.file(),
                line = record.line(),
                status = %status,
                "status contradicts source table"
            );
        }

        if let Some(taxon) = usage.as_taxon_mut() {
            taxon.webpage = url(record, &[AcefTerm::InfraSpeciesURL, AcefTerm::SpeciesURL]);
            taxon.lifezones = lifezones(record);
            taxon.fossil = flag(
                record,
                &[AcefTerm::HasPreHolocene, AcefTerm::IsFossil],
                Issue::IsFossilInvalid,
            );
            taxon.recent = flag(
                record,
                &[AcefTerm::HasModern, AcefTerm::IsRecent],
                Issue::IsRecentInvalid,
            );
            usage.according_to = record.get(AcefTerm::LTSSpecialist).map(str::to_string);
            if let Some(raw) = record.get(AcefTerm::LTSDate).map(str::to_string) {
                usage.according_to_date = parse_date(&raw);
                if usage.according_to_date.is_none() {
                    record.add_issue(Issue::AccordingToDateInvalid);
                }
            }
        }
        usage.remarks = record.get(AcefTerm::AdditionalData).map(str::to_string);
        usage.classification = interpret_classification(record, synonym);
        Some(usage)
    }

    /// Parses `Sp2000NameStatus`, falling back to the table's default.
    fn interpret_status(&self, record: &mut RawRecord, synonym: bool) -> TaxonomicStatus {
        let default = if synonym {
            TaxonomicStatus::Synonym
        } else {
            TaxonomicStatus::Accepted
        };
        match record
            .get(AcefTerm::Sp2000NameStatus)
            .map(str::parse::<TaxonomicStatus>)
        {
            None => default,
            Some(Ok(status)) => status,
            Some(Err(_)) => {
                record.add_issue(Issue::TaxonomicStatusInvalid);
                default
            }
        }
    }

    // === Names ===

    /// Builds the name of a usage row.
    ///
    /// Rows of the accepted infraspecies table only get a preliminary name.
    fn interpret_name(&self, record: &mut RawRecord, id_term: AcefTerm) -> Option<ParsedName> {
        let infraspecific = record.has(AcefTerm::InfraSpeciesEpithet);
        let (rank, authorship) = if infraspecific {
            let rank = match record.get(AcefTerm::InfraSpeciesMarker) {
                None => Rank::Subspecies,
                Some(marker) => marker.parse().unwrap_or(Rank::InfraspecificName),
            };
            (rank, record.get(AcefTerm::InfraSpeciesAuthorString))
        } else if record.has(AcefTerm::SpeciesEpithet) {
            (Rank::Species, record.get(AcefTerm::AuthorString))
        } else if record.has(AcefTerm::SubGenusName) {
            (Rank::Subgenus, record.get(AcefTerm::AuthorString))
        } else if record.has(AcefTerm::Genus) {
            (Rank::Genus, record.get(AcefTerm::AuthorString))
        } else {
            return None;
        };

        let mut issues = IssueSet::new();
        if let Some(authorship) = authorship {
            if !brackets_balanced(authorship) {
                issues.insert(Issue::UnmatchedNameBrackets);
            }
            if authorship.chars().count() == ACEF_AUTHOR_MAX {
                issues.insert(Issue::TruncatedName);
            }
        }

        let id = record.get(id_term);
        let name = if *record.row_type() == AcefTerm::AcceptedInfraSpecificTaxa.into() {
            let mut name = ParsedName::preliminary(id.map(str::to_string), rank);
            name.code = self.code;
            Some(name)
        } else {
            self.names.build(&NameAtoms {
                id,
                genus: record.get(AcefTerm::Genus),
                infrageneric_epithet: record.get(AcefTerm::SubGenusName),
                specific_epithet: record.get(AcefTerm::SpeciesEpithet),
                infraspecific_epithet: record.get(AcefTerm::InfraSpeciesEpithet),
                rank: Some(rank),
                authorship,
                code: self.code,
            })
        };

        for issue in issues {
            record.add_issue(issue);
        }
        if name.is_none() {
            record.add_issue(Issue::UnparsableName);
        }
        name
    }

    /// Completes a preliminary infraspecific name with the epithets of its
    /// parent species.
    ///
    /// Without a parent the genus and species given on the record itself
    /// are used. Returns `None` when no name can be built at all.
    pub fn complete_infraspecific_name(
        &self,
        record: &RawRecord,
        preliminary: &ParsedName,
        parent: Option<&ParsedName>,
    ) -> Option<ParsedName> {
        let genus = parent
            .and_then(|p| p.genus.as_deref())
            .or_else(|| record.get(AcefTerm::Genus));
        let infrageneric = parent
            .and_then(|p| p.infrageneric_epithet.as_deref())
            .or_else(|| record.get(AcefTerm::SubGenusName));
        let species = parent
            .and_then(|p| p.specific_epithet.as_deref())
            .or_else(|| record.get(AcefTerm::SpeciesEpithet));

        let mut name = self.names.build(&NameAtoms {
            id: preliminary.id.as_deref(),
            genus,
            infrageneric_epithet: infrageneric,
            specific_epithet: species,
            infraspecific_epithet: record.get(AcefTerm::InfraSpeciesEpithet),
            rank: Some(preliminary.rank),
            authorship: record.get(AcefTerm::InfraSpeciesAuthorString),
            code: preliminary.code.or(self.code),
        })?;
        name.verbatim_key = preliminary.verbatim_key;
        name.origin = preliminary.origin;
        name.published_in_id.clone_from(&preliminary.published_in_id);
        name.published_in_page.clone_from(&preliminary.published_in_page);
        name.issues.extend(preliminary.issues.iter().copied());
        Some(name)
    }

    // === Distributions and Vernacular Names ===

    /// Interprets a `Distribution` row into one distribution per area.
    pub fn interpret_distributions(
        &self,
        record: &mut RawRecord,
        references: &dyn ReferenceLookup,
        key: VerbatimKey,
    ) -> Vec<Distribution> {
        let Some(raw) = record.get(AcefTerm::DistributionElement).map(str::to_string) else {
            return Vec::new();
        };
        let gazetteer = match record.get(AcefTerm::StandardInUse).map(str::parse::<Gazetteer>) {
            None => Gazetteer::Text,
            Some(Ok(gazetteer)) => gazetteer,
            Some(Err(_)) => {
                record.add_issue(Issue::DistributionGazeteerInvalid);
                Gazetteer::Text
            }
        };
        let status = match record
            .get(AcefTerm::DistributionStatus)
            .map(str::parse::<DistributionStatus>)
        {
            Some(Ok(status)) => status,
            _ => {
                record.add_issue(Issue::DistributionStatusInvalid);
                DistributionStatus::Native
            }
        };
        let reference_id = self.reference_id(record, references);
        let distribution = |area: &str, gazetteer: Gazetteer| Distribution {
            area: area.to_string(),
            gazetteer,
            status,
            reference_id: reference_id.clone(),
            verbatim_key: Some(key),
            issues: IssueSet::new(),
        };

        if gazetteer == Gazetteer::Text {
            return vec![distribution(&raw, Gazetteer::Text)];
        }

        let mut distributions = Vec::new();
        for value in raw
            .split(MULTI_VALUE_SEPARATORS)
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            let qualified = if value.contains(':') {
                value.to_string()
            } else {
                format!("{}:{value}", gazetteer.prefix())
            };
            let area = Area::parse(&qualified);
            if area.gazetteer == Gazetteer::Text {
                record.add_issue(Issue::DistributionAreaInvalid);
                distributions.push(distribution(value, Gazetteer::Text));
                continue;
            }
            if area.gazetteer != gazetteer {
                tracing::info!(
                    file = record.file(),
                    line = record.line(),
                    area = %value,
                    found = %area.gazetteer,
                    declared = %gazetteer,
                    "area standard differs from declared standard"
                );
            }
            distributions.push(distribution(&area.code, gazetteer));
        }
        distributions
    }

    /// Interprets a `CommonNames` row.
    pub fn interpret_vernacular(
        &self,
        record: &mut RawRecord,
        references: &dyn ReferenceLookup,
        key: VerbatimKey,
    ) -> Option<VernacularName> {
        let Some(name) = record.get(AcefTerm::CommonName).map(str::to_string) else {
            record.add_issue(Issue::VernacularNameInvalid);
            return None;
        };
        let reference_id = self.reference_id(record, references);
        let text = |term: AcefTerm| record.get(term).map(str::to_string);
        Some(VernacularName {
            name,
            transliteration: text(AcefTerm::TransliteratedName),
            language: text(AcefTerm::Language),
            country: text(AcefTerm::Country),
            area: text(AcefTerm::Area),
            reference_id,
            verbatim_key: Some(key),
            issues: IssueSet::new(),
        })
    }

    /// Resolves the record's `ReferenceID` against staged references.
    fn reference_id(
        &self,
        record: &mut RawRecord,
        references: &dyn ReferenceLookup,
    ) -> Option<String> {
        let id = record.get(AcefTerm::ReferenceID)?.to_string();
        if references.reference_exists(&id) {
            return Some(id);
        }
        tracing::info!(
            reference_id = %id,
            file = record.file(),
            line = record.line(),
            "referenced ReferenceID does not exist"
        );
        record.add_issue(Issue::ReferenceIdInvalid);
        None
    }

    // === Metadata ===

    /// Reads the `SourceDatabase` row.
    pub fn interpret_metadata(&self, record: &RawRecord) -> DatasetMetadata {
        let text = |term: AcefTerm| record.get(term).map(str::to_string);
        let percent = |term: AcefTerm| record.get(term).and_then(|v| v.trim().parse::<u8>().ok());
        DatasetMetadata {
            title: text(AcefTerm::DatabaseFullName),
            alias: text(AcefTerm::DatabaseShortName),
            version: text(AcefTerm::DatabaseVersion),
            released: record.get(AcefTerm::ReleaseDate).and_then(parse_date),
            authors_and_editors: text(AcefTerm::AuthorsEditors),
            taxonomic_coverage: text(AcefTerm::TaxonomicCoverage),
            group_name: text(AcefTerm::GroupNameInEnglish),
            description: text(AcefTerm::Abstract),
            organisation: text(AcefTerm::Organisation),
            website: text(AcefTerm::HomeURL),
            contact: text(AcefTerm::ContactPerson),
            geographic_coverage: text(AcefTerm::Coverage),
            completeness: percent(AcefTerm::Completeness),
            confidence: percent(AcefTerm::Confidence),
        }
    }
}

/// Copies the flat higher classification. The genus of a synonym row
/// belongs to the synonym's own name, so only accepted rows fill genus and
/// subgenus.
fn interpret_classification(record: &RawRecord, synonym: bool) -> Classification {
    let text = |term: AcefTerm| record.get(term).map(str::to_string);
    let mut classification = Classification {
        kingdom: text(AcefTerm::Kingdom),
        phylum: text(AcefTerm::Phylum),
        class: text(AcefTerm::Class),
        order: text(AcefTerm::Order),
        superfamily: text(AcefTerm::Superfamily),
        family: text(AcefTerm::Family),
        ..Classification::default()
    };
    if !synonym {
        classification.genus = text(AcefTerm::Genus);
        classification.subgenus = text(AcefTerm::SubGenusName);
    }
    classification
}

fn url(record: &mut RawRecord, terms: &[AcefTerm]) -> Option<String> {
    let raw = record.get_first(terms)?.to_string();
    let url = normalize_url(&raw);
    if url.is_none() {
        record.add_issue(Issue::UrlInvalid);
    }
    url
}

fn flag(record: &mut RawRecord, terms: &[AcefTerm], issue: Issue) -> Option<bool> {
    let value = parse_bool(record.get_first(terms)?);
    if value.is_none() {
        record.add_issue(issue);
    }
    value
}

fn lifezones(record: &mut RawRecord) -> BTreeSet<Lifezone> {
    let Some(raw) = record.get(AcefTerm::LifeZone).map(str::to_string) else {
        return BTreeSet::new();
    };
    let mut lifezones = BTreeSet::new();
    for value in raw
        .split(MULTI_VALUE_SEPARATORS)
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        match value.parse() {
            Ok(lifezone) => {
                lifezones.insert(lifezone);
            }
            Err(_) => record.add_issue(Issue::LifezoneInvalid),
        }
    }
    lifezones
}

/// Parses full dates, year-month values and bare years.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d") {
        return Some(date);
    }
    if value.len() == 4
        && let Ok(year) = value.parse::<i32>()
    {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    None
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Some(true),
        "0" | "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Accepts http(s) links and bare host names, which get an `http://` scheme.
fn normalize_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return None;
    }
    let lower = value.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(value.to_string());
    }
    if lower.contains("://") || !value.contains('.') {
        return None;
    }
    Some(format!("http://{value}"))
}
