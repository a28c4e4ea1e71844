//! Relation resolution over the staged usages.
//!
//! Runs once after all usages are staged. Infraspecific taxa get their
//! names completed from the parent species, parent ids turn into
//! `PARENT_OF` edges and accepted ids of synonyms into `SYNONYM_OF` edges.

use checklist_model::{HasIssues, Issue, NameUsage, Rank, TaxonomicStatus};
use checklist_store::{
    Label, NodeBatchProcessor, NodeId, RelType, Result, StagedPayload, StagingStore,
};
use serde::Serialize;

use crate::acef::AcefInterpreter;

/// Counters of one resolver pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub processed: usize,
    pub completed_names: usize,
    pub removed: usize,
    pub parent_edges: usize,
    pub synonym_edges: usize,
    pub roots: usize,
}

/// Batch handler resolving relations node by node.
pub struct RelationResolver<'a> {
    interpreter: &'a AcefInterpreter,
    stats: ResolverStats,
}

impl<'a> RelationResolver<'a> {
    pub fn new(interpreter: &'a AcefInterpreter) -> Self {
        Self {
            interpreter,
            stats: ResolverStats::default(),
        }
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    fn resolve_taxon(
        &mut self,
        store: &mut StagingStore,
        node: NodeId,
        mut usage: NameUsage,
    ) -> Result<()> {
        let mut changed = false;
        let parent_id = usage.as_taxon().and_then(|taxon| taxon.parent_id.clone());
        let mut parent = match &parent_id {
            Some(id) => store.node_by_id(id)?,
            None => None,
        };
        if let Some(p) = parent
            && (p == node || store.labels(p).contains(Label::Synonym))
        {
            tracing::debug!(node = %node, parent = %p, "parent is not an accepted taxon");
            parent = None;
        }
        if let Some(id) = &parent_id
            && parent.is_none()
        {
            tracing::debug!(node = %node, parent_id = %id, "parent id not resolved");
            usage.add_issue(Issue::ParentIdInvalid);
            changed = true;
        }

        if !usage.name.is_complete() {
            let parent_name = match parent {
                Some(p) => store.read_name(p)?,
                None => None,
            };
            let record = match usage.verbatim_key {
                Some(key) => store.verbatim(key)?,
                None => None,
            };
            let completed = record.as_ref().and_then(|record| {
                self.interpreter.complete_infraspecific_name(
                    record,
                    &usage.name,
                    parent_name.as_ref(),
                )
            });
            let Some(mut name) = completed else {
                tracing::info!(
                    node = %node,
                    id = ?usage.id,
                    "no name could be built, removing usage"
                );
                store.delete(node)?;
                if let Some(key) = usage.verbatim_key {
                    store.add_verbatim_issue(key, Issue::NotInterpreted)?;
                }
                self.stats.removed += 1;
                return Ok(());
            };
            let parent_is_species = parent_name
                .as_ref()
                .is_none_or(|parent| parent.rank == Rank::Species);
            if !name.rank.is_infraspecific() || !parent_is_species {
                name.add_issue(Issue::InconsistentName);
            }
            usage.name = name;
            self.stats.completed_names += 1;
            changed = true;
        }

        match parent {
            Some(p) => {
                if store.create_rel(p, RelType::ParentOf, node)? {
                    self.stats.parent_edges += 1;
                }
            }
            None => {
                store.add_label(node, Label::Root)?;
                self.stats.roots += 1;
            }
        }
        if changed {
            store.update(node, &StagedPayload::Usage(usage))?;
        }
        Ok(())
    }

    fn resolve_synonym(
        &mut self,
        store: &mut StagingStore,
        node: NodeId,
        mut usage: NameUsage,
    ) -> Result<()> {
        let accepted_ids = usage
            .as_synonym()
            .map(|synonym| synonym.accepted_ids.clone())
            .unwrap_or_default();
        let homotypic = usage.status() == TaxonomicStatus::HomotypicSynonym;
        let mut invalid = accepted_ids.is_empty();
        for id in &accepted_ids {
            match store.node_by_id(id)? {
                Some(accepted)
                    if accepted != node && !store.labels(accepted).contains(Label::Synonym) =>
                {
                    if store.create_synonym_rel(node, accepted, homotypic)? {
                        self.stats.synonym_edges += 1;
                    }
                }
                _ => {
                    tracing::debug!(node = %node, accepted_id = %id, "accepted id not resolved");
                    invalid = true;
                }
            }
        }
        if invalid && !usage.has_issue(Issue::AcceptedIdInvalid) {
            usage.add_issue(Issue::AcceptedIdInvalid);
            store.update(node, &StagedPayload::Usage(usage))?;
        }
        Ok(())
    }
}

impl NodeBatchProcessor for RelationResolver<'_> {
    fn process(&mut self, store: &mut StagingStore, node: NodeId) -> Result<()> {
        let Some(usage) = store.read_usage(node, false)? else {
            return Ok(());
        };
        self.stats.processed += 1;
        if usage.is_synonym() {
            self.resolve_synonym(store, node, usage)
        } else {
            self.resolve_taxon(store, node, usage)
        }
    }

    fn commit_batch(&mut self, processed: usize) {
        tracing::debug!(processed, "resolved relation batch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_model::{
        AcefTerm, AtomizedNameParser, NameAtoms, NameParser, ParsedName, RawRecord, Term,
    };
    use checklist_store::StoreConfig;
    use std::collections::BTreeMap;

    fn species(id: &str, genus: &str, epithet: &str) -> NameUsage {
        let name = AtomizedNameParser
            .build(&NameAtoms {
                id: Some(id),
                genus: Some(genus),
                specific_epithet: Some(epithet),
                ..Default::default()
            })
            .unwrap();
        NameUsage::taxon(name, TaxonomicStatus::Accepted)
    }

    fn stage(store: &mut StagingStore, labels: &[Label], usage: NameUsage) -> NodeId {
        let node = store.create_node(labels);
        store.put(node, &StagedPayload::Usage(usage)).unwrap();
        node
    }

    fn taxon(store: &mut StagingStore, usage: NameUsage) -> NodeId {
        stage(store, &[Label::Name, Label::Taxon], usage)
    }

    fn infraspecies(store: &mut StagingStore, id: &str, parent: &str, marker: &str) -> NodeId {
        let values: BTreeMap<Term, String> = [
            (AcefTerm::AcceptedTaxonID, id),
            (AcefTerm::ParentSpeciesID, parent),
            (AcefTerm::InfraSpeciesEpithet, "nana"),
            (AcefTerm::InfraSpeciesMarker, marker),
        ]
        .into_iter()
        .map(|(term, value)| (Term::from(term), value.to_string()))
        .collect();
        let record = RawRecord::new(
            "AcceptedInfraSpecificTaxa.txt",
            2,
            AcefTerm::AcceptedInfraSpecificTaxa.into(),
            values,
        );
        let key = store.put_verbatim(&record).unwrap();
        let rank = marker.parse().unwrap_or(Rank::InfraspecificName);
        let mut name = ParsedName::preliminary(Some(id.to_string()), rank);
        name.verbatim_key = Some(key);
        let mut usage = NameUsage::taxon(name, TaxonomicStatus::Accepted);
        usage.verbatim_key = Some(key);
        if let Some(taxon) = usage.as_taxon_mut() {
            taxon.parent_id = Some(parent.to_string());
        }
        taxon(store, usage)
    }

    fn resolve(store: &mut StagingStore) -> ResolverStats {
        let interpreter = AcefInterpreter::default();
        let mut resolver = RelationResolver::new(&interpreter);
        store.process_all(2, &mut resolver).unwrap();
        resolver.stats()
    }

    #[test]
    fn test_completes_infraspecific_names() {
        let mut store = StagingStore::open(StoreConfig::in_memory()).unwrap();
        let parent = taxon(&mut store, species("1", "Abies", "alba"));
        let child = infraspecies(&mut store, "10", "1", "var.");

        let stats = resolve(&mut store);
        assert_eq!(stats.completed_names, 1);
        assert_eq!(stats.parent_edges, 1);
        assert_eq!(store.incoming(child, RelType::ParentOf), vec![parent]);
        assert!(store.labels(parent).contains(Label::Root));

        let usage = store.read_usage(child, true).unwrap().unwrap();
        assert_eq!(usage.name.scientific_name.as_deref(), Some("Abies alba var. nana"));
        assert_eq!(usage.relations.parent.as_deref(), Some("1"));
        assert!(!usage.name.has_issue(Issue::InconsistentName));
        assert!(!store.props(child).unwrap().provisional);
    }

    #[test]
    fn test_flags_non_infraspecific_rank() {
        let mut store = StagingStore::open(StoreConfig::in_memory()).unwrap();
        taxon(&mut store, species("1", "Abies", "alba"));
        let child = infraspecies(&mut store, "10", "1", "sp.");

        resolve(&mut store);
        let usage = store.read_usage(child, false).unwrap().unwrap();
        assert_eq!(usage.name.rank, Rank::Species);
        assert!(usage.name.has_issue(Issue::InconsistentName));
    }

    #[test]
    fn test_removes_unbuildable_names() {
        let mut store = StagingStore::open(StoreConfig::in_memory()).unwrap();
        let orphan = infraspecies(&mut store, "10", "missing", "var.");
        let key = store.read_usage(orphan, false).unwrap().unwrap().verbatim_key.unwrap();

        let stats = resolve(&mut store);
        assert_eq!(stats.removed, 1);
        assert!(!store.contains(orphan));
        let record = store.verbatim(key).unwrap().unwrap();
        assert!(record.has_issue(Issue::NotInterpreted));
    }

    #[test]
    fn test_links_synonyms() {
        let mut store = StagingStore::open(StoreConfig::in_memory()).unwrap();
        let accepted = taxon(&mut store, species("1", "Abies", "alba"));
        let other = taxon(&mut store, species("3", "Picea", "abies"));
        let mut synonym = species("2", "Pinus", "picea");
        synonym.convert_to_synonym(TaxonomicStatus::ProparteSynonym).unwrap();
        if let Some(s) = synonym.as_synonym_mut() {
            s.accepted_ids = vec!["1".into(), "3".into(), "404".into()];
        }
        let syn = stage(&mut store, &[Label::Name, Label::Synonym], synonym);

        let stats = resolve(&mut store);
        assert_eq!(stats.synonym_edges, 2);
        assert_eq!(store.outgoing(syn, RelType::SynonymOf), vec![accepted, other]);
        let usage = store.read_usage(syn, true).unwrap().unwrap();
        assert_eq!(usage.relations.accepted, vec!["1".to_string(), "3".to_string()]);
        assert!(usage.has_issue(Issue::AcceptedIdInvalid));
        assert!(!store.labels(syn).contains(Label::Root));
    }
}
