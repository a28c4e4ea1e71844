//! Tests for schema discovery and record streaming.

use std::fs;
use std::path::Path;

use checklist_ingest::{Charset, IngestError, ReaderOptions, SchemaReader};
use checklist_model::{AcefTerm, HasIssues, Issue, Term, TermRegistry};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: impl AsRef<[u8]>) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, content).expect("write file");
}

fn open(dir: &TempDir, options: ReaderOptions) -> SchemaReader {
    SchemaReader::from_folder(dir.path(), TermRegistry::acef(), options).expect("open reader")
}

fn wide_file(columns: usize, known: &[&str]) -> String {
    let header: Vec<String> = (0..columns)
        .map(|i| {
            known
                .get(i)
                .map_or_else(|| format!("extra{i}"), |name| (*name).to_string())
        })
        .collect();
    let mut content = header.join(",");
    content.push('\n');
    for row in 0..5 {
        let cells: Vec<String> = (0..columns).map(|i| format!("v{row}x{i}")).collect();
        content.push_str(&cells.join(","));
        content.push('\n');
    }
    content
}

#[test]
fn discovers_wide_comma_files_per_file() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "AcceptedSpecies.csv",
        wide_file(100, &["AcceptedTaxonID", "Genus", "SpeciesEpithet"]),
    );
    write(
        dir.path(),
        "Synonyms.csv",
        wide_file(99, &["ID", "AcceptedTaxonID", "Genus", "SpeciesEpithet"]),
    );
    let reader = open(&dir, ReaderOptions::default());

    let accepted = reader
        .schema(&AcefTerm::AcceptedSpecies.into())
        .expect("accepted schema");
    assert_eq!(accepted.format.delimiter, b',');
    assert_eq!(accepted.columns.len(), 100);
    assert_eq!(accepted.unknown_count(), 97);

    let synonyms = reader
        .schema(&AcefTerm::Synonyms.into())
        .expect("synonym schema");
    assert_eq!(synonyms.format.delimiter, b',');
    assert_eq!(synonyms.columns.len(), 99);

    let records: Vec<_> = reader
        .stream(&AcefTerm::Synonyms.into())
        .expect("stream")
        .collect::<Result<_, _>>()
        .expect("records");
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].get(AcefTerm::Genus), Some("v0x2"));
}

#[test]
fn unlisted_delimiter_uses_sniffed_fallback() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "Reference.txt",
        "ReferenceID:Author:Title\nr1:Smith:Flora\nr2:Jones:Fauna\n",
    );
    let reader = open(&dir, ReaderOptions::default());
    let schema = reader
        .schema(&AcefTerm::Reference.into())
        .expect("reference schema");
    assert_eq!(schema.format.delimiter, b':');

    let record = reader
        .stream(&AcefTerm::Reference.into())
        .expect("stream")
        .next()
        .expect("first record")
        .expect("record");
    assert_eq!(record.get(AcefTerm::Author), Some("Smith"));
    assert_eq!(record.get(AcefTerm::Title), Some("Flora"));
}

#[test]
fn decodes_latin1_files() {
    let dir = TempDir::new().expect("temp dir");
    let mut content = b"AcceptedTaxonID\tCommonName\tLanguage\n".to_vec();
    content.extend_from_slice(b"1\t\xC9l\xE9phant\tFran\xE7ais\n");
    write(dir.path(), "data/CommonNames.txt", content);

    let reader = open(&dir, ReaderOptions::default());
    let schema = reader
        .schema(&AcefTerm::CommonNames.into())
        .expect("common names schema");
    assert!(matches!(
        schema.charset,
        Charset::Latin1 | Charset::Windows1252
    ));
    let record = reader
        .stream(&AcefTerm::CommonNames.into())
        .expect("stream")
        .next()
        .expect("first record")
        .expect("record");
    assert_eq!(record.get(AcefTerm::CommonName), Some("Éléphant"));
    assert_eq!(record.get(AcefTerm::Language), Some("Français"));
}

#[test]
fn skips_short_and_empty_rows_with_provenance() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "AcceptedSpecies.txt",
        "AcceptedTaxonID\tGenus\tSpeciesEpithet\n\
         1\tAbies\talba\n\
         2\tPinus\n\
         \t\t\n\
         3\t  Picea \tNULL\n",
    );
    let mut reader = open(&dir, ReaderOptions::default().with_sample_lines(2));
    let row_type: Term = AcefTerm::AcceptedSpecies.into();
    assert!(reader.add_default(&row_type, AcefTerm::Kingdom, "Plantae"));

    let mut stream = reader.stream(&row_type).expect("stream");
    let first = stream.next().expect("first").expect("record");
    assert_eq!(first.line(), 2);
    assert!(first.issues().is_empty());
    assert_eq!(first.get(AcefTerm::Kingdom), Some("Plantae"));

    let second = stream.next().expect("second").expect("record");
    assert_eq!(second.line(), 5);
    assert_eq!(second.get(AcefTerm::Genus), Some("Picea"));
    assert_eq!(second.get(AcefTerm::SpeciesEpithet), None);
    assert!(second.has_issue(Issue::PreviousLineSkipped));

    assert!(stream.next().is_none());
    assert_eq!(stream.skipped(), 2);
    assert_eq!(stream.emitted(), 2);
}

#[test]
fn joins_rows_split_by_stray_line_breaks() {
    let dir = TempDir::new().expect("temp dir");
    let mut content = String::from("AcceptedTaxonID\tFamily\tGenus\tSpeciesEpithet\n");
    for id in 10..80 {
        content.push_str(&format!("{id}\tPinaceae\tAbies\tsp{id}\n"));
    }
    content.push_str("1\tfirst\nsecond\tAbies\talba\n");
    write(dir.path(), "AcceptedSpecies.txt", content);

    let reader = open(&dir, ReaderOptions::default());
    let mut stream = reader
        .stream(&AcefTerm::AcceptedSpecies.into())
        .expect("stream");
    let records: Vec<_> = stream.by_ref().collect::<Result<_, _>>().expect("records");
    assert_eq!(records.len(), 71);
    assert_eq!(stream.skipped(), 0);

    let joined = records
        .iter()
        .find(|record| record.get(AcefTerm::AcceptedTaxonID) == Some("1"))
        .expect("taxon 1 streamed");
    assert_eq!(joined.line(), 72);
    assert_eq!(joined.get(AcefTerm::Family), Some("first second"));
    assert_eq!(joined.get(AcefTerm::Genus), Some("Abies"));
    assert_eq!(joined.get(AcefTerm::SpeciesEpithet), Some("alba"));
    assert!(joined.issues().is_empty());
}

#[test]
fn format_subfolder_and_prefix() {
    let dir = TempDir::new().expect("temp dir");
    write(
        dir.path(),
        "acef/Synonyms.tab",
        "acef:ID\tacef:AcceptedTaxonID\n1\t2\n",
    );
    let reader = open(
        &dir,
        ReaderOptions::default()
            .with_subfolder("acef")
            .with_term_prefix(Some("acef".into())),
    );
    let schema = reader
        .schema(&AcefTerm::Synonyms.into())
        .expect("synonym schema");
    assert!(schema.has_term(&AcefTerm::AcceptedTaxonID.into()));
    assert_eq!(schema.unknown_count(), 0);
}

#[test]
fn ignores_unrecognized_suffixes() {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "Synonyms.xlsx", "ID\tGenus\n1\tAbies\n");
    let err = SchemaReader::from_folder(dir.path(), TermRegistry::acef(), ReaderOptions::default())
        .expect_err("no data files");
    assert!(matches!(err, IngestError::SourceInvalid { .. }));
}
