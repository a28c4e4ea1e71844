//! End to end imports of small ACEF folders.

use std::fs;
use std::path::Path;

use checklist_core::{
    AcefInserter, ImportOptions, ImportSummary, NormalizationError, Phase, import_acef, open_acef,
};
use checklist_ingest::ReaderOptions;
use checklist_model::{HasIssues, Issue, NameUsage, Rank, TaxonomicStatus};
use checklist_store::{Label, RelType, StagingStore, StoreConfig};
use tempfile::TempDir;

const SPECIES: &str = "AcceptedTaxonID\tFamily\tGenus\tSpeciesEpithet\tAuthorString\tSp2000NameStatus\n\
1\tPinaceae\tAbies\talba\tMill.\taccepted name\n\
2\tPinaceae\tPicea\tabies\t(L.) H.Karst.\taccepted name\n";

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, content).expect("write file");
}

fn source(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (name, content) in files {
        write(dir.path(), name, content);
    }
    dir
}

fn import(dir: &TempDir) -> (StagingStore, ImportSummary) {
    let mut store = StagingStore::open(StoreConfig::in_memory()).expect("open store");
    let summary = import_acef(dir.path(), &mut store, &ImportOptions::default().with_batch_size(2))
        .expect("import");
    (store, summary)
}

fn usage(store: &StagingStore, id: &str) -> NameUsage {
    let node = store.node_by_id(id).expect("lookup").expect("node exists");
    store.read_usage(node, true).expect("read").expect("usage")
}

#[test]
fn imports_species_with_metadata_and_ranks() {
    let dir = source(&[
        ("AcceptedSpecies.txt", SPECIES),
        (
            "SourceDatabase.txt",
            "DatabaseFullName\tDatabaseVersion\tReleaseDate\nWorld Conifers\t2.1\t2019-03-01\n",
        ),
    ]);
    let (store, summary) = import(&dir);

    assert_eq!(summary.taxa, 2);
    assert_eq!(summary.roots, 2);
    assert_eq!(summary.ranks.get(&Rank::Species), Some(&2));
    assert_eq!(summary.counts.row_types["AcceptedSpecies"].inserted, 2);
    let metadata = summary.metadata.expect("metadata");
    assert_eq!(metadata.title.as_deref(), Some("World Conifers"));
    assert_eq!(metadata.version.as_deref(), Some("2.1"));

    let abies = usage(&store, "1");
    assert_eq!(abies.name.scientific_name.as_deref(), Some("Abies alba"));
    assert_eq!(abies.status(), TaxonomicStatus::Accepted);
}

#[test]
fn completes_infraspecies_from_parent() {
    let dir = source(&[
        ("AcceptedSpecies.txt", SPECIES),
        (
            "AcceptedInfraSpecificTaxa.txt",
            "AcceptedTaxonID\tParentSpeciesID\tInfraSpeciesEpithet\tInfraSpeciesMarker\n\
             10\t1\tnana\tvar.\n\
             11\t1\tminor\tsp.\n",
        ),
    ]);
    let (store, summary) = import(&dir);

    assert_eq!(summary.resolver.completed_names, 2);
    let variety = usage(&store, "10");
    assert_eq!(
        variety.name.scientific_name.as_deref(),
        Some("Abies alba var. nana")
    );
    assert_eq!(variety.relations.parent.as_deref(), Some("1"));
    assert!(!variety.name.has_issue(Issue::InconsistentName));

    let odd = usage(&store, "11");
    assert!(odd.name.has_issue(Issue::InconsistentName));
}

#[test]
fn merges_pro_parte_synonyms() {
    let dir = source(&[
        ("AcceptedSpecies.txt", SPECIES),
        (
            "Synonyms.txt",
            "ID\tAcceptedTaxonID\tGenus\tSpeciesEpithet\tSp2000NameStatus\n\
             5\t1\tPinus\tpicea\tsynonym\n\
             5\t2\tPinus\tpicea\tsynonym\n\
             5\t2\tPinus\tpicea\tsynonym\n",
        ),
    ]);
    let (store, summary) = import(&dir);

    assert_eq!(summary.synonyms, 1);
    let node = store.node_by_id("5").expect("lookup").expect("synonym");
    assert!(store.labels(node).contains(Label::Synonym));
    assert_eq!(store.outgoing(node, RelType::SynonymOf).len(), 2);
    let synonym = usage(&store, "5");
    assert_eq!(synonym.status(), TaxonomicStatus::ProparteSynonym);
    assert_eq!(summary.issues.get(&Issue::DuplicateName), Some(&1));
    assert_eq!(summary.issues.get(&Issue::TaxonIdInvalid), Some(&1));
    assert_eq!(summary.issues.get(&Issue::NotInterpreted), None);
}

#[test]
fn drops_synonyms_without_genus_and_continues() {
    let dir = source(&[
        ("AcceptedSpecies.txt", SPECIES),
        (
            "Synonyms.txt",
            "ID\tAcceptedTaxonID\tSpeciesEpithet\n5\t1\tpicea\n",
        ),
    ]);
    let (_store, summary) = import(&dir);

    assert_eq!(summary.taxa, 2);
    assert_eq!(summary.synonyms, 0);
    assert!(!summary.counts.row_types.contains_key("Synonyms"));
}

#[test]
fn substitutes_status_of_accepted_rows() {
    let dir = source(&[(
        "AcceptedSpecies.txt",
        "AcceptedTaxonID\tGenus\tSpeciesEpithet\tSp2000NameStatus\n\
         1\tAbies\talba\tsynonym\n\
         2\tPicea\tabies\tfoo bar\n",
    )]);
    let (store, _summary) = import(&dir);

    let substituted = usage(&store, "1");
    assert_eq!(substituted.status(), TaxonomicStatus::Doubtful);
    assert!(substituted.has_issue(Issue::TaxonomicStatusInvalid));

    let unparsable = usage(&store, "2");
    assert_eq!(unparsable.status(), TaxonomicStatus::Accepted);
    let key = unparsable.verbatim_key.expect("verbatim key");
    let record = store.verbatim(key).expect("read").expect("record");
    assert!(record.has_issue(Issue::TaxonomicStatusInvalid));
}

#[test]
fn flags_truncated_authorship_on_verbatim_record() {
    let author = "A".repeat(100);
    let content = format!("AcceptedTaxonID\tGenus\tSpeciesEpithet\tAuthorString\n1\tAbies\talba\t{author}\n");
    let dir = source(&[("AcceptedSpecies.txt", &content)]);
    let (store, _summary) = import(&dir);

    let key = usage(&store, "1").verbatim_key.expect("verbatim key");
    let record = store.verbatim(key).expect("read").expect("record");
    assert!(record.has_issue(Issue::TruncatedName));
}

#[test]
fn reports_missing_reference_once_per_taxon() {
    let dir = source(&[
        ("AcceptedSpecies.txt", SPECIES),
        (
            "Reference.txt",
            "ReferenceID\tAuthor\tYear\tTitle\nR1\tFarjon A.\t2010\tA handbook of the world's conifers\n",
        ),
        (
            "NameReferencesLinks.txt",
            "ID\tReferenceID\tReferenceType\n\
             1\tR9\tTaxAccRef\n\
             1\tR8\tNomRef\n\
             2\tR1\tNomRef\n\
             2\tR1\tTaxAccRef\n",
        ),
    ]);
    let (store, summary) = import(&dir);

    assert_eq!(summary.issues.get(&Issue::ReferenceIdInvalid), Some(&1));
    assert!(usage(&store, "1").has_issue(Issue::ReferenceIdInvalid));

    let picea = usage(&store, "2");
    assert_eq!(picea.name.published_in_id.as_deref(), Some("R1"));
    assert!(picea.reference_ids.contains("R1"));
    assert_eq!(summary.links.published_in, 1);
    assert_eq!(summary.links.unresolved, 2);
}

#[test]
fn flags_broken_reference_links() {
    let dir = source(&[
        ("AcceptedSpecies.txt", SPECIES),
        (
            "Reference.txt",
            "ReferenceID\tAuthor\tYear\tTitle\tDetails\n\
             R1\tFarjon A.\t2010\tA handbook of the world's conifers\tLeiden, p. 34\n\
             R2\tEckenwalder J.E.\t2009\tConifers of the world\tPortland: 120\n",
        ),
        (
            "NameReferencesLinks.txt",
            "ID\tReferenceID\tReferenceType\n\
             404\tR1\tNomRef\n\
             1\tR2\tBogusRef\n\
             1\tR1\tNomRef\n\
             2\tR1\tNomRef\n\
             2\tR2\tNomRef\n\
             2\tR1\tComNameRef\n",
        ),
    ]);
    let (store, summary) = import(&dir);

    assert_eq!(summary.links.rows, 6);
    assert_eq!(summary.links.unresolved, 1);
    assert_eq!(summary.links.invalid_type, 1);
    assert_eq!(summary.links.published_in, 3);
    assert_eq!(summary.links.ignored, 1);
    assert_eq!(summary.links.bibliography, 0);

    let handbook = store.reference_by_id("R1").expect("lookup").expect("R1");
    assert!(handbook.has_issue(Issue::TaxonIdInvalid));
    assert!(!handbook.has_issue(Issue::ReftypeInvalid));
    let world = store.reference_by_id("R2").expect("lookup").expect("R2");
    assert!(world.has_issue(Issue::ReftypeInvalid));
    assert!(!world.has_issue(Issue::TaxonIdInvalid));

    let abies = usage(&store, "1");
    assert!(abies.has_issue(Issue::ReftypeInvalid));
    assert_eq!(abies.name.published_in_id.as_deref(), Some("R1"));
    assert_eq!(abies.name.published_in_page.as_deref(), Some("34"));
    assert!(!abies.name.has_issue(Issue::MultiplePublishedInReferences));

    let picea = usage(&store, "2");
    assert!(picea.name.has_issue(Issue::MultiplePublishedInReferences));
    assert_eq!(picea.name.published_in_id.as_deref(), Some("R2"));
    assert_eq!(picea.name.published_in_page.as_deref(), Some("120"));
    assert!(picea.reference_ids.is_empty());
    assert!(!picea.has_issue(Issue::ReftypeInvalid));
}

#[test]
fn counts_distributions_of_missing_taxa() {
    let dir = source(&[
        ("AcceptedSpecies.txt", SPECIES),
        (
            "Distribution.txt",
            "AcceptedTaxonID\tDistributionElement\tStandardInUse\tDistributionStatus\n\
             1\tDE; FR\tISO\tnative\n\
             404\tDE\tISO\tnative\n",
        ),
        (
            "CommonNames.txt",
            "AcceptedTaxonID\tCommonName\tLanguage\n1\tWeißtanne\tdeu\n",
        ),
    ]);
    let (store, summary) = import(&dir);

    assert_eq!(summary.bad_taxon_fk_total(), 1);
    assert_eq!(summary.counts.bad_taxon_fk["Distribution"], 1);
    let abies = usage(&store, "1");
    let taxon = abies.as_taxon().expect("taxon");
    assert_eq!(taxon.distributions.len(), 2);
    assert_eq!(taxon.vernacular_names.len(), 1);
    assert_eq!(taxon.vernacular_names[0].name, "Weißtanne");
}

#[test]
fn rejects_phases_out_of_order() {
    let dir = source(&[("AcceptedSpecies.txt", SPECIES)]);
    let reader = open_acef(dir.path(), ReaderOptions::default()).expect("open source");
    let mut store = StagingStore::open(StoreConfig::in_memory()).expect("open store");
    let mut inserter = AcefInserter::new(&reader, &mut store, &ImportOptions::default());

    let err = inserter.post_batch_insert().expect_err("second phase first");
    assert!(matches!(
        err,
        NormalizationError::PhaseOrder {
            phase: Phase::PostBatchInsert
        }
    ));
    inserter.batch_insert().expect("first phase");
    let err = inserter.batch_insert().expect_err("first phase twice");
    assert!(matches!(
        err,
        NormalizationError::PhaseOrder {
            phase: Phase::BatchInsert
        }
    ));
    inserter.post_batch_insert().expect("second phase");
}

#[test]
fn fails_without_accepted_species() {
    let dir = source(&[("Synonyms.txt", "ID\tAcceptedTaxonID\tGenus\tSpeciesEpithet\n5\t1\tPinus\tpicea\n")]);
    let mut store = StagingStore::open(StoreConfig::in_memory()).expect("open store");
    let err = import_acef(dir.path(), &mut store, &ImportOptions::default())
        .expect_err("no accepted species");
    assert!(matches!(err, NormalizationError::Source(_)));
}
