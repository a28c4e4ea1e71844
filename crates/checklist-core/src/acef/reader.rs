//! Opening an ACEF source folder.

use std::path::Path;

use checklist_ingest::{ReaderOptions, Result, SchemaReader};
use checklist_model::{ACEF_PREFIX, AcefTerm, Term, TermRegistry};

/// Format-named subfolder searched besides the root and `data/`.
pub const ACEF_SUBFOLDER: &str = "acef";

/// Row types of the ACEF vocabulary in insertion order.
pub const ACEF_ROW_TYPES: [AcefTerm; 8] = [
    AcefTerm::SourceDatabase,
    AcefTerm::Reference,
    AcefTerm::AcceptedSpecies,
    AcefTerm::AcceptedInfraSpecificTaxa,
    AcefTerm::Synonyms,
    AcefTerm::Distribution,
    AcefTerm::CommonNames,
    AcefTerm::NameReferencesLinks,
];

/// Fields a file must map, or its schema is dropped.
const REQUIRED_FIELDS: &[(AcefTerm, &[AcefTerm])] = &[
    (
        AcefTerm::AcceptedSpecies,
        &[
            AcefTerm::AcceptedTaxonID,
            AcefTerm::Genus,
            AcefTerm::SpeciesEpithet,
        ],
    ),
    (
        AcefTerm::AcceptedInfraSpecificTaxa,
        &[
            AcefTerm::AcceptedTaxonID,
            AcefTerm::ParentSpeciesID,
            AcefTerm::InfraSpeciesEpithet,
        ],
    ),
    (
        AcefTerm::Synonyms,
        &[
            AcefTerm::ID,
            AcefTerm::AcceptedTaxonID,
            AcefTerm::Genus,
            AcefTerm::SpeciesEpithet,
        ],
    ),
    (AcefTerm::Reference, &[AcefTerm::ReferenceID]),
    (
        AcefTerm::NameReferencesLinks,
        &[AcefTerm::ID, AcefTerm::ReferenceID],
    ),
    (
        AcefTerm::Distribution,
        &[AcefTerm::AcceptedTaxonID, AcefTerm::DistributionElement],
    ),
    (
        AcefTerm::CommonNames,
        &[AcefTerm::AcceptedTaxonID, AcefTerm::CommonName],
    ),
];

/// Fills in the ACEF subfolder and term prefix unless set explicitly.
pub fn acef_options(mut options: ReaderOptions) -> ReaderOptions {
    if options.subfolder.is_none() {
        options.subfolder = Some(ACEF_SUBFOLDER.to_string());
    }
    if options.term_prefix.is_none() {
        options.term_prefix = Some(ACEF_PREFIX.to_string());
    }
    options
}

/// Discovers the ACEF files of a folder and validates them.
///
/// Files whose row type lies outside the ACEF vocabulary are ignored and
/// files lacking a required field are dropped. Only `AcceptedSpecies` is
/// required for the source to be importable at all.
///
/// # Errors
///
/// [`checklist_ingest::IngestError::SourceInvalid`] when no usable files are
/// found or the accepted species file is missing.
pub fn open_acef(folder: impl AsRef<Path>, options: ReaderOptions) -> Result<SchemaReader> {
    let mut reader = SchemaReader::from_folder(folder, TermRegistry::acef(), acef_options(options))?;
    reader.filter_schemas(|schema| schema.row_type.prefix() == Some(ACEF_PREFIX));

    for (row_type, fields) in REQUIRED_FIELDS {
        let row_type = Term::from(*row_type);
        for field in *fields {
            if !reader.require(&row_type, *field) {
                break;
            }
        }
    }

    reader.require_schema(&AcefTerm::AcceptedSpecies.into())?;
    let all: Vec<Term> = ACEF_ROW_TYPES.iter().copied().map(Term::from).collect();
    reader.report_missing_schemas(&all);
    Ok(reader)
}
