//! Tests for closing and reopening a directory-backed store.

use checklist_model::{
    AtomizedNameParser, DatasetMetadata, NameAtoms, NameParser, NameUsage, Reference,
    ReferenceLookup, TaxonomicStatus,
};
use checklist_store::{GRAPH_FILE, Label, RelType, StagedPayload, StagingStore, StoreConfig};
use tempfile::TempDir;

fn usage(id: &str, species: &str) -> NameUsage {
    let name = AtomizedNameParser
        .build(&NameAtoms {
            id: Some(id),
            genus: Some("Abies"),
            specific_epithet: Some(species),
            authorship: Some("Mill."),
            ..Default::default()
        })
        .expect("name");
    NameUsage::taxon(name, TaxonomicStatus::Accepted)
}

#[test]
fn reopened_store_restores_graph_and_payloads() {
    let dir = TempDir::new().expect("temp dir");
    let config = StoreConfig::default().with_dir(dir.path());

    let (parent, child) = {
        let mut store = StagingStore::open(config.clone()).expect("open store");
        let parent = store.create_node(&[Label::Name, Label::Taxon, Label::Root]);
        let child = store.create_node(&[Label::Name, Label::Taxon]);
        store
            .put(parent, &StagedPayload::Usage(usage("1", "alba")))
            .expect("put parent");
        store
            .put(child, &StagedPayload::Usage(usage("2", "nordmanniana")))
            .expect("put child");
        store
            .create_rel(parent, RelType::ParentOf, child)
            .expect("create rel");
        store
            .put_reference(&Reference {
                id: Some("r1".into()),
                citation: Some("Miller (1768). Gard. Dict.".into()),
                ..Reference::default()
            })
            .expect("put reference");
        store
            .put_metadata(&DatasetMetadata {
                title: Some("Conifers".into()),
                ..DatasetMetadata::default()
            })
            .expect("put metadata");
        store.close();
        (parent, child)
    };
    assert!(dir.path().join(GRAPH_FILE).exists());

    let store = StagingStore::open(config).expect("reopen store");
    assert_eq!(store.node_by_id("2").expect("lookup"), Some(child));
    assert_eq!(store.node_by_canonical("Abies alba").expect("lookup"), Some(parent));
    assert!(store.labels(parent).contains(Label::Root));

    let read = store
        .read_usage(child, true)
        .expect("read")
        .expect("usage");
    assert_eq!(read.relations.parent.as_deref(), Some("1"));
    assert_eq!(read.name.scientific_name.as_deref(), Some("Abies nordmanniana"));

    assert!(store.reference_exists("r1"));
    let reference = store
        .reference_by_id("r1")
        .expect("read reference")
        .expect("reference");
    assert_eq!(reference.citation.as_deref(), Some("Miller (1768). Gard. Dict."));
    assert_eq!(
        store.metadata().expect("metadata").and_then(|m| m.title),
        Some("Conifers".to_string())
    );
}

#[test]
fn dropping_a_store_flushes_the_graph() {
    let dir = TempDir::new().expect("temp dir");
    let config = StoreConfig::default().with_dir(dir.path());
    {
        let mut store = StagingStore::open(config.clone()).expect("open store");
        let node = store.create_node(&[Label::Name]);
        store
            .put(node, &StagedPayload::Usage(usage("9", "pinsapo")))
            .expect("put");
    }
    let store = StagingStore::open(config).expect("reopen store");
    assert_eq!(store.node_count(Some(Label::Name)), 1);
}
