//! The staging store: graph arena plus binary payload store.
//!
//! The graph holds node identities, labels, typed edges and a few small
//! mirrored properties backing the lookup indices. Full payloads (names,
//! usages with their distributions and vernacular names, raw records and
//! references) live in the payload store keyed by the same identity.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use checklist_model::{
    DatasetMetadata, HasIssues, Issue, NameUsage, ParsedName, RawRecord, Rank, Reference,
    ReferenceLookup, TaxonomicStatus, VerbatimKey,
};
use serde::{Deserialize, Serialize};

use crate::codec::{CodecPool, DEFAULT_POOL_SIZE};
use crate::error::{Result, StoreError};
use crate::node::{Label, Labels, NodeId, NodeProps, RelType};
use crate::payload::{PayloadKind, PayloadStore};
use crate::persist::{GraphState, load_state, save_state};

/// File name of the persisted graph inside a store directory.
pub const GRAPH_FILE: &str = "graph.bin";

/// File name of the payload database inside a store directory.
pub const PAYLOAD_FILE: &str = "payload.sqlite";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the store files, `None` for a purely in-memory store.
    pub dir: Option<PathBuf>,

    /// Idle serializers kept by the codec pool.
    pub codec_pool_size: usize,

    /// Canonical name plus rank lookups returning more nodes than this log a warning.
    /// Defaults to 10.
    pub canonical_match_warn_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: None,
            codec_pool_size: DEFAULT_POOL_SIZE,
            canonical_match_warn_threshold: 10,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_codec_pool_size(mut self, size: usize) -> Self {
        self.codec_pool_size = size;
        self
    }

    #[must_use]
    pub fn with_canonical_match_warn_threshold(mut self, threshold: usize) -> Self {
        self.canonical_match_warn_threshold = threshold;
        self
    }
}

/// Payload stored for a node: a bare name or a full usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagedPayload {
    Name(ParsedName),
    Usage(NameUsage),
}

impl StagedPayload {
    pub fn name(&self) -> &ParsedName {
        match self {
            StagedPayload::Name(name) => name,
            StagedPayload::Usage(usage) => &usage.name,
        }
    }

    pub fn name_mut(&mut self) -> &mut ParsedName {
        match self {
            StagedPayload::Name(name) => name,
            StagedPayload::Usage(usage) => &mut usage.name,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            StagedPayload::Name(name) => name.id.as_deref(),
            StagedPayload::Usage(usage) => usage.id.as_deref(),
        }
    }

    pub fn as_usage(&self) -> Option<&NameUsage> {
        match self {
            StagedPayload::Usage(usage) => Some(usage),
            StagedPayload::Name(_) => None,
        }
    }

    pub fn into_usage(self) -> Option<NameUsage> {
        match self {
            StagedPayload::Usage(usage) => Some(usage),
            StagedPayload::Name(_) => None,
        }
    }

    fn props(&self) -> NodeProps {
        let name = self.name();
        NodeProps {
            id: self.id().map(str::to_string),
            scientific_name: name.scientific_name.clone(),
            canonical_name: name.canonical_name(),
            rank: Some(name.rank),
            authorship: name.authorship_label(),
            provisional: !name.is_complete(),
        }
    }

    fn issues(&self) -> Vec<Issue> {
        match self {
            StagedPayload::Name(name) => name.issues.iter().copied().collect(),
            StagedPayload::Usage(usage) => {
                let mut issues: Vec<Issue> = usage.all_issues().into_iter().collect();
                if let Some(taxon) = usage.as_taxon() {
                    for distribution in &taxon.distributions {
                        issues.extend(distribution.issues.iter().copied());
                    }
                    for vernacular in &taxon.vernacular_names {
                        issues.extend(vernacular.issues.iter().copied());
                    }
                }
                issues
            }
        }
    }
}

/// Handler driven by [`StagingStore::process`].
pub trait NodeBatchProcessor {
    fn process(&mut self, store: &mut StagingStore, node: NodeId) -> Result<()>;

    /// Called after every `batch_size` processed nodes and once at the end.
    fn commit_batch(&mut self, _processed: usize) {}
}

pub struct StagingStore {
    config: StoreConfig,
    state: GraphState,
    payload: Option<PayloadStore>,
    codecs: CodecPool,
    snapshot: Option<GraphState>,
}

impl StagingStore {
    /// Opens a store, restoring a previously closed one found in the directory.
    ///
    /// # Errors
    ///
    /// Fails if the directory, the payload database or an existing graph
    /// file cannot be opened. Nothing stays open on failure.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let (payload, state) = match &config.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|e| StoreError::Io {
                    operation: "create directory",
                    path: dir.clone(),
                    source: e,
                })?;
                let payload = PayloadStore::open(Some(&dir.join(PAYLOAD_FILE)))?;
                let graph_file = dir.join(GRAPH_FILE);
                let state = if graph_file.exists() {
                    load_state(&graph_file)?
                } else {
                    GraphState::default()
                };
                (payload, state)
            }
            None => (PayloadStore::open(None)?, GraphState::default()),
        };
        tracing::info!(
            dir = ?config.dir,
            nodes = state.graph.len(),
            "opened staging store"
        );
        Ok(Self {
            codecs: CodecPool::new(config.codec_pool_size),
            config,
            state,
            payload: Some(payload),
            snapshot: None,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn dir(&self) -> Option<&Path> {
        self.config.dir.as_deref()
    }

    fn payload(&self) -> Result<&PayloadStore> {
        self.payload.as_ref().ok_or(StoreError::Closed)
    }

    fn encode_put<T: Serialize>(
        &self,
        kind: PayloadKind,
        key: u64,
        what: &'static str,
        value: &T,
    ) -> Result<()> {
        let payload = self.payload()?;
        let mut codec = self.codecs.acquire();
        let bytes = codec.encode(what, value)?;
        payload.put(kind, key, bytes)
    }

    fn get_decode<T: serde::de::DeserializeOwned>(
        &self,
        kind: PayloadKind,
        key: u64,
        what: &'static str,
    ) -> Result<Option<T>> {
        let Some(bytes) = self.payload()?.get(kind, key)? else {
            return Ok(None);
        };
        self.codecs.acquire().decode(what, &bytes).map(Some)
    }

    fn ensure_node(&self, node: NodeId) -> Result<()> {
        if self.state.graph.contains(node) {
            Ok(())
        } else {
            Err(StoreError::NodeNotFound { node })
        }
    }

    // === Nodes ===

    /// Creates a node without payload.
    pub fn create_node(&mut self, labels: &[Label]) -> NodeId {
        self.state.graph.create_node(Labels::from(labels))
    }

    /// Writes the node's payload and mirrors its small properties.
    pub fn put(&mut self, node: NodeId, payload: &StagedPayload) -> Result<()> {
        self.ensure_node(node)?;
        self.encode_put(PayloadKind::Node, node.value(), "node payload", payload)?;
        self.state.graph.set_props(node, payload.props());
        Ok(())
    }

    /// Same as [`StagingStore::put`], for payloads read and modified before.
    pub fn update(&mut self, node: NodeId, payload: &StagedPayload) -> Result<()> {
        self.put(node, payload)
    }

    /// Loads a node's payload.
    ///
    /// A usage on a node labelled `SYNONYM` is returned as a synonym even
    /// when the stored payload still says taxon. With `include_relations`
    /// the ids of parent, accepted and basionym nodes are filled in.
    pub fn read(&self, node: NodeId, include_relations: bool) -> Result<Option<StagedPayload>> {
        let Some(mut payload) =
            self.get_decode::<StagedPayload>(PayloadKind::Node, node.value(), "node payload")?
        else {
            return Ok(None);
        };
        let labels = self.state.graph.labels(node).unwrap_or_default();
        if let StagedPayload::Usage(usage) = &mut payload {
            if labels.contains(Label::Synonym) && !usage.is_synonym() {
                usage.convert_to_synonym(TaxonomicStatus::Synonym)?;
            }
            if include_relations {
                self.fill_relations(node, usage);
            }
        }
        Ok(Some(payload))
    }

    /// Reads the node's usage, `None` for bare names and missing payloads.
    pub fn read_usage(&self, node: NodeId, include_relations: bool) -> Result<Option<NameUsage>> {
        Ok(self
            .read(node, include_relations)?
            .and_then(StagedPayload::into_usage))
    }

    /// Reads the name of any node.
    pub fn read_name(&self, node: NodeId) -> Result<Option<ParsedName>> {
        Ok(self.read(node, false)?.map(|payload| match payload {
            StagedPayload::Name(name) => name,
            StagedPayload::Usage(usage) => usage.name,
        }))
    }

    fn fill_relations(&self, node: NodeId, usage: &mut NameUsage) {
        let graph = &self.state.graph;
        let id_of = |other: NodeId| graph.props(other).and_then(|props| props.id.clone());

        let parents = graph.incoming(node, RelType::ParentOf);
        if parents.len() > 1 {
            tracing::warn!(node = %node, count = parents.len(), "multiple parent relations");
            usage.add_issue(Issue::MultipleRelations);
        }
        usage.relations.parent = parents.first().and_then(|edge| id_of(edge.start));

        usage.relations.accepted = graph
            .outgoing(node, RelType::SynonymOf)
            .iter()
            .filter_map(|edge| id_of(edge.end))
            .collect();

        let basionyms = graph.outgoing(node, RelType::HasBasionym);
        if basionyms.len() > 1 {
            tracing::warn!(node = %node, count = basionyms.len(), "multiple basionym relations");
            usage.add_issue(Issue::MultipleRelations);
        }
        usage.relations.basionym = basionyms.first().and_then(|edge| id_of(edge.end));
    }

    /// Removes the node's payload, its edges and the node itself.
    pub fn delete(&mut self, node: NodeId) -> Result<()> {
        self.ensure_node(node)?;
        self.payload()?.delete(PayloadKind::Node, node.value())?;
        self.state.graph.delete_node(node);
        Ok(())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.state.graph.contains(node)
    }

    pub fn props(&self, node: NodeId) -> Option<&NodeProps> {
        self.state.graph.props(node)
    }

    pub fn node_count(&self, label: Option<Label>) -> usize {
        self.state.graph.node_ids(label).count()
    }

    // === Lookups ===

    /// The node staged under a business id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotUnique`] if several nodes share the id.
    pub fn node_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        unique("id", id, self.state.graph.nodes_by_id(id))
    }

    /// The node with the given canonical name, under the same contract.
    pub fn node_by_canonical(&self, canonical: &str) -> Result<Option<NodeId>> {
        unique(
            "canonical name",
            canonical,
            self.state.graph.nodes_by_canonical(canonical),
        )
    }

    /// All nodes with the given canonical name and rank.
    pub fn nodes_by_canonical_rank(&self, canonical: &str, rank: Rank) -> Vec<NodeId> {
        let graph = &self.state.graph;
        let matches: Vec<NodeId> = graph
            .nodes_by_canonical(canonical)
            .iter()
            .copied()
            .filter(|node| graph.props(*node).is_some_and(|p| p.rank == Some(rank)))
            .collect();
        if matches.len() > self.config.canonical_match_warn_threshold {
            tracing::warn!(
                canonical,
                rank = %rank,
                count = matches.len(),
                "large number of matching names"
            );
        }
        matches
    }

    // === Labels and Edges ===

    pub fn labels(&self, node: NodeId) -> Labels {
        self.state.graph.labels(node).unwrap_or_default()
    }

    pub fn add_label(&mut self, node: NodeId, label: Label) -> Result<()> {
        if self.state.graph.add_label(node, label) {
            Ok(())
        } else {
            Err(StoreError::NodeNotFound { node })
        }
    }

    pub fn remove_label(&mut self, node: NodeId, label: Label) -> Result<()> {
        if self.state.graph.remove_label(node, label) {
            Ok(())
        } else {
            Err(StoreError::NodeNotFound { node })
        }
    }

    /// Creates a typed edge. Returns false if it already existed.
    pub fn create_rel(&mut self, start: NodeId, rel: RelType, end: NodeId) -> Result<bool> {
        self.ensure_node(start)?;
        self.ensure_node(end)?;
        Ok(self.state.graph.add_edge(start, rel, end, false))
    }

    /// Creates a `SYNONYM_OF` edge from synonym to accepted taxon.
    pub fn create_synonym_rel(
        &mut self,
        synonym: NodeId,
        accepted: NodeId,
        homotypic: bool,
    ) -> Result<bool> {
        self.ensure_node(synonym)?;
        self.ensure_node(accepted)?;
        Ok(self
            .state
            .graph
            .add_edge(synonym, RelType::SynonymOf, accepted, homotypic))
    }

    /// End nodes of the node's outgoing edges of one type.
    pub fn outgoing(&self, node: NodeId, rel: RelType) -> Vec<NodeId> {
        self.state
            .graph
            .outgoing(node, rel)
            .into_iter()
            .map(|edge| edge.end)
            .collect()
    }

    /// Start nodes of the node's incoming edges of one type.
    pub fn incoming(&self, node: NodeId, rel: RelType) -> Vec<NodeId> {
        self.state
            .graph
            .incoming(node, rel)
            .into_iter()
            .map(|edge| edge.start)
            .collect()
    }

    pub fn edges(&self, node: NodeId, rel: RelType) -> Vec<crate::node::Edge> {
        self.state.graph.outgoing(node, rel)
    }

    // === Traversal ===

    /// Visits every live node in storage order.
    pub fn process_all(
        &mut self,
        batch_size: usize,
        handler: &mut dyn NodeBatchProcessor,
    ) -> Result<usize> {
        self.process(None, batch_size, handler)
    }

    /// Visits the nodes carrying `label`, or all nodes, in storage order.
    ///
    /// Nodes deleted by the handler before they are reached are skipped.
    /// Returns the number of processed nodes.
    pub fn process(
        &mut self,
        label: Option<Label>,
        batch_size: usize,
        handler: &mut dyn NodeBatchProcessor,
    ) -> Result<usize> {
        let batch_size = batch_size.max(1);
        let nodes: Vec<NodeId> = self.state.graph.node_ids(label).collect();
        let mut processed = 0usize;
        for node in nodes {
            if !self.state.graph.contains(node) {
                continue;
            }
            handler.process(self, node)?;
            processed += 1;
            if processed % batch_size == 0 {
                handler.commit_batch(processed);
            }
        }
        if processed % batch_size != 0 {
            handler.commit_batch(processed);
        }
        tracing::debug!(label = ?label, processed, "processed nodes");
        Ok(processed)
    }

    // === Transactions ===

    /// Runs `f` as one transaction over both halves of the store.
    ///
    /// On error all graph and payload changes made by `f` are undone.
    ///
    /// Graph rollback restores a full copy of the graph state taken when the
    /// transaction opens, so graph memory roughly doubles until `f` returns.
    /// Keep transactions to one batch of work on large graphs. Payload
    /// rollback goes through the sqlite transaction and costs no extra memory.
    pub fn in_transaction<T, E>(
        &mut self,
        f: impl FnOnce(&mut Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<StoreError>,
    {
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionActive.into());
        }
        self.payload()?.begin()?;
        self.snapshot = Some(self.state.clone());
        match f(self) {
            Ok(value) => {
                self.snapshot = None;
                self.payload()?.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.abort_transaction();
                Err(err)
            }
        }
    }

    pub fn in_transaction_active(&self) -> bool {
        self.snapshot.is_some()
    }

    fn abort_transaction(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.state = snapshot;
        }
        if let Some(payload) = &self.payload
            && let Err(err) = payload.rollback()
        {
            tracing::error!(error = %err, "failed to roll back payload transaction");
        }
        tracing::warn!("transaction rolled back");
    }

    // === Verbatim Records ===

    pub fn put_verbatim(&mut self, record: &RawRecord) -> Result<VerbatimKey> {
        let key = self.state.next_verbatim;
        self.encode_put(PayloadKind::Verbatim, key, "verbatim record", record)?;
        self.state.next_verbatim += 1;
        Ok(VerbatimKey(key))
    }

    pub fn verbatim(&self, key: VerbatimKey) -> Result<Option<RawRecord>> {
        self.get_decode(PayloadKind::Verbatim, key.0, "verbatim record")
    }

    /// Overwrites a verbatim record. Only its issues are expected to change.
    pub fn update_verbatim(&mut self, key: VerbatimKey, record: &RawRecord) -> Result<()> {
        self.encode_put(PayloadKind::Verbatim, key.0, "verbatim record", record)
    }

    /// Adds an issue to a stored verbatim record, if it exists.
    pub fn add_verbatim_issue(&mut self, key: VerbatimKey, issue: Issue) -> Result<()> {
        if let Some(mut record) = self.verbatim(key)? {
            record.add_issue(issue);
            self.update_verbatim(key, &record)?;
        }
        Ok(())
    }

    pub fn verbatim_count(&self) -> Result<usize> {
        self.payload()?.count(PayloadKind::Verbatim)
    }

    // === References ===

    /// Stores a reference, replacing any earlier one with the same id.
    pub fn put_reference(&mut self, reference: &Reference) -> Result<()> {
        let existing = reference
            .id
            .as_ref()
            .and_then(|id| self.state.references.get(id).copied());
        let key = existing.unwrap_or(self.state.next_reference);
        self.encode_put(PayloadKind::Reference, key, "reference", reference)?;
        if existing.is_none() {
            self.state.next_reference += 1;
            if let Some(id) = &reference.id {
                self.state.references.insert(id.clone(), key);
            }
        }
        Ok(())
    }

    pub fn update_reference(&mut self, reference: &Reference) -> Result<()> {
        self.put_reference(reference)
    }

    pub fn reference_by_id(&self, id: &str) -> Result<Option<Reference>> {
        match self.state.references.get(id) {
            Some(key) => self.get_decode(PayloadKind::Reference, *key, "reference"),
            None => Ok(None),
        }
    }

    pub fn reference_count(&self) -> Result<usize> {
        self.payload()?.count(PayloadKind::Reference)
    }

    // === Metadata ===

    pub fn put_metadata(&mut self, metadata: &DatasetMetadata) -> Result<()> {
        self.encode_put(PayloadKind::Metadata, 0, "metadata", metadata)
    }

    pub fn metadata(&self) -> Result<Option<DatasetMetadata>> {
        self.get_decode(PayloadKind::Metadata, 0, "metadata")
    }

    // === Reporting ===

    /// Issue counts over verbatim records, names, usages and references.
    pub fn issue_counts(&self) -> Result<BTreeMap<Issue, usize>> {
        let payload = self.payload()?;
        let mut counts: BTreeMap<Issue, usize> = BTreeMap::new();
        let mut count = |issues: &mut dyn Iterator<Item = Issue>| {
            for issue in issues {
                *counts.entry(issue).or_default() += 1;
            }
        };
        for key in payload.keys(PayloadKind::Verbatim)? {
            if let Some(record) = self.verbatim(VerbatimKey(key))? {
                count(&mut record.issues().iter().copied());
            }
        }
        for node in self.state.graph.node_ids(None) {
            if let Some(staged) = self.read(node, false)? {
                count(&mut staged.issues().into_iter());
            }
        }
        for key in payload.keys(PayloadKind::Reference)? {
            if let Some(reference) =
                self.get_decode::<Reference>(PayloadKind::Reference, key, "reference")?
            {
                count(&mut reference.issues.iter().copied());
            }
        }
        Ok(counts)
    }

    // === Lifecycle ===

    pub fn is_closed(&self) -> bool {
        self.payload.is_none()
    }

    /// Flushes the graph to disk and closes the payload database.
    ///
    /// Idempotent. Failures are logged, never returned.
    pub fn close(&mut self) {
        let Some(payload) = self.payload.take() else {
            return;
        };
        if self.snapshot.is_some() {
            tracing::warn!("closing store with an open transaction");
            self.snapshot = None;
            if let Err(err) = payload.rollback() {
                tracing::error!(error = %err, "failed to roll back payload transaction");
            }
        }
        if let Some(dir) = &self.config.dir {
            let path = dir.join(GRAPH_FILE);
            if let Err(err) = save_state(&self.state, &path) {
                tracing::error!(path = %path.display(), error = %err, "failed to save graph");
            }
        }
        if let Err(err) = payload.close() {
            tracing::error!(error = %err, "failed to close payload store");
        }
        tracing::info!(nodes = self.state.graph.len(), "closed staging store");
    }
}

impl Drop for StagingStore {
    fn drop(&mut self) {
        self.close();
    }
}

impl ReferenceLookup for StagingStore {
    fn reference_exists(&self, id: &str) -> bool {
        self.state.references.contains_key(id)
    }
}

fn unique(index: &'static str, key: &str, nodes: &[NodeId]) -> Result<Option<NodeId>> {
    match nodes {
        [] => Ok(None),
        [node] => Ok(Some(*node)),
        _ => Err(StoreError::NotUnique {
            index,
            key: key.to_string(),
            count: nodes.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_model::{AtomizedNameParser, NameAtoms, NameParser};

    fn store() -> StagingStore {
        StagingStore::open(StoreConfig::in_memory()).unwrap()
    }

    fn usage(id: &str, genus: &str, species: &str) -> NameUsage {
        let name = AtomizedNameParser
            .build(&NameAtoms {
                id: Some(id),
                genus: Some(genus),
                specific_epithet: Some(species),
                ..Default::default()
            })
            .unwrap();
        NameUsage::taxon(name, TaxonomicStatus::Accepted)
    }

    #[test]
    fn test_put_read_round_trip() {
        let mut store = store();
        let node = store.create_node(&[Label::Name, Label::Taxon]);
        let payload = StagedPayload::Usage(usage("1", "Abies", "alba"));
        store.put(node, &payload).unwrap();
        assert_eq!(store.read(node, false).unwrap(), Some(payload));
        let props = store.props(node).unwrap();
        assert_eq!(props.canonical_name.as_deref(), Some("Abies alba"));
        assert!(!props.provisional);
    }

    #[test]
    fn test_synonym_label_overlays_payload() {
        let mut store = store();
        let node = store.create_node(&[Label::Name, Label::Synonym]);
        store
            .put(node, &StagedPayload::Usage(usage("1", "Abies", "alba")))
            .unwrap();
        let read = store.read_usage(node, false).unwrap().unwrap();
        assert!(read.is_synonym());
        assert_eq!(read.status(), TaxonomicStatus::Synonym);
    }

    #[test]
    fn test_id_lookup_distinguishes_not_unique() {
        let mut store = store();
        assert_eq!(store.node_by_id("1").unwrap(), None);
        for _ in 0..2 {
            let node = store.create_node(&[Label::Taxon]);
            store
                .put(node, &StagedPayload::Usage(usage("1", "Abies", "alba")))
                .unwrap();
        }
        assert!(matches!(
            store.node_by_id("1"),
            Err(StoreError::NotUnique { count: 2, .. })
        ));
        assert_eq!(store.nodes_by_canonical_rank("Abies alba", Rank::Species).len(), 2);
        assert!(store.nodes_by_canonical_rank("Abies alba", Rank::Genus).is_empty());
    }

    #[test]
    fn test_relations_and_multiple_parents() {
        let mut store = store();
        let a = store.create_node(&[Label::Taxon]);
        let b = store.create_node(&[Label::Taxon]);
        let child = store.create_node(&[Label::Taxon]);
        store.put(a, &StagedPayload::Usage(usage("a", "Abies", "alba"))).unwrap();
        store.put(b, &StagedPayload::Usage(usage("b", "Pinus", "nigra"))).unwrap();
        store.put(child, &StagedPayload::Usage(usage("c", "Picea", "abies"))).unwrap();

        store.create_rel(a, RelType::ParentOf, child).unwrap();
        let read = store.read_usage(child, true).unwrap().unwrap();
        assert_eq!(read.relations.parent.as_deref(), Some("a"));
        assert!(!read.has_issue(Issue::MultipleRelations));

        store.create_rel(b, RelType::ParentOf, child).unwrap();
        let read = store.read_usage(child, true).unwrap().unwrap();
        assert!(read.has_issue(Issue::MultipleRelations));
    }

    #[test]
    fn test_delete_keeps_verbatim() {
        let mut store = store();
        let record = RawRecord::new(
            "Synonyms.txt",
            2,
            checklist_model::AcefTerm::Synonyms.into(),
            BTreeMap::new(),
        );
        let key = store.put_verbatim(&record).unwrap();
        let node = store.create_node(&[Label::Name]);
        let name = ParsedName::preliminary(Some("x".into()), Rank::Species);
        store.put(node, &StagedPayload::Name(name)).unwrap();
        store.delete(node).unwrap();
        assert!(store.read(node, false).unwrap().is_none());
        assert_eq!(store.node_by_id("x").unwrap(), None);
        store.add_verbatim_issue(key, Issue::NotInterpreted).unwrap();
        assert!(store.verbatim(key).unwrap().unwrap().has_issue(Issue::NotInterpreted));
    }

    #[test]
    fn test_transaction_rolls_back_both_halves() {
        let mut store = store();
        let kept = store.create_node(&[Label::Taxon]);
        let result: Result<()> = store.in_transaction(|store| {
            let node = store.create_node(&[Label::Taxon]);
            store.put(node, &StagedPayload::Usage(usage("t", "Abies", "alba")))?;
            store.put_reference(&Reference {
                id: Some("r1".into()),
                ..Reference::default()
            })?;
            Err(StoreError::NodeNotFound { node })
        });
        assert!(result.is_err());
        assert_eq!(store.node_count(None), 1);
        assert!(store.contains(kept));
        assert!(!store.reference_exists("r1"));
        assert_eq!(store.reference_count().unwrap(), 0);
        assert!(!store.in_transaction_active());
    }

    #[test]
    fn test_committed_transaction_releases_snapshot() {
        let mut store = store();
        let node = store
            .in_transaction(|store| -> Result<NodeId> {
                assert!(store.in_transaction_active());
                let node = store.create_node(&[Label::Taxon]);
                store.put(node, &StagedPayload::Usage(usage("t", "Abies", "alba")))?;
                Ok(node)
            })
            .unwrap();
        assert!(!store.in_transaction_active());
        assert!(store.contains(node));
        assert_eq!(store.node_by_id("t").unwrap(), Some(node));
    }

    struct Counter {
        seen: Vec<NodeId>,
        commits: Vec<usize>,
    }

    impl NodeBatchProcessor for Counter {
        fn process(&mut self, _store: &mut StagingStore, node: NodeId) -> Result<()> {
            self.seen.push(node);
            Ok(())
        }

        fn commit_batch(&mut self, processed: usize) {
            self.commits.push(processed);
        }
    }

    #[test]
    fn test_process_batches_by_label() {
        let mut store = store();
        for i in 0..5 {
            let labels: &[Label] = if i % 2 == 0 { &[Label::Taxon] } else { &[Label::Synonym] };
            store.create_node(labels);
        }
        let mut counter = Counter {
            seen: Vec::new(),
            commits: Vec::new(),
        };
        let processed = store.process(Some(Label::Taxon), 2, &mut counter).unwrap();
        assert_eq!(processed, 3);
        assert_eq!(counter.commits, vec![2, 3]);

        let mut counter = Counter {
            seen: Vec::new(),
            commits: Vec::new(),
        };
        assert_eq!(store.process_all(10, &mut counter).unwrap(), 5);
        assert_eq!(counter.commits, vec![5]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut store = store();
        store.close();
        store.close();
        assert!(store.is_closed());
        assert!(matches!(store.verbatim_count(), Err(StoreError::Closed)));
    }
}
