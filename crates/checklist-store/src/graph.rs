//! In-memory node arena with per-node adjacency lists and lookup indices.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::node::{Edge, Label, Labels, NodeId, NodeProps, RelType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Link {
    rel: RelType,
    node: NodeId,
    homotypic: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NodeData {
    labels: Labels,
    props: NodeProps,
    outgoing: Vec<Link>,
    incoming: Vec<Link>,
}

/// Node arena. Slots of deleted nodes stay empty so identities remain stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Option<NodeData>>,
    #[serde(skip)]
    by_id: HashMap<String, Vec<NodeId>>,
    #[serde(skip)]
    by_canonical: HashMap<String, Vec<NodeId>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, labels: Labels) -> NodeId {
        let node = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(Some(NodeData {
            labels,
            ..NodeData::default()
        }));
        node
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.data(node).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self, node: NodeId) -> Option<Labels> {
        self.data(node).map(|data| data.labels)
    }

    /// Returns false if the node does not exist.
    pub fn add_label(&mut self, node: NodeId, label: Label) -> bool {
        self.data_mut(node)
            .map(|data| data.labels.insert(label))
            .is_some()
    }

    pub fn remove_label(&mut self, node: NodeId, label: Label) -> bool {
        self.data_mut(node)
            .map(|data| data.labels.remove(label))
            .is_some()
    }

    pub fn props(&self, node: NodeId) -> Option<&NodeProps> {
        self.data(node).map(|data| &data.props)
    }

    /// Replaces the mirrored properties and keeps the indices in sync.
    pub fn set_props(&mut self, node: NodeId, props: NodeProps) -> bool {
        let Some(data) = self.data_mut(node) else {
            return false;
        };
        let old = std::mem::replace(&mut data.props, props.clone());
        self.unindex(node, &old);
        self.index(node, &props);
        true
    }

    /// Removes a node with all its incident edges.
    pub fn delete_node(&mut self, node: NodeId) -> bool {
        let Some(data) = self.nodes.get_mut(node.index()).and_then(Option::take) else {
            return false;
        };
        for link in &data.outgoing {
            if let Some(other) = self.data_mut(link.node) {
                other.incoming.retain(|back| back.node != node);
            }
        }
        for link in &data.incoming {
            if let Some(other) = self.data_mut(link.node) {
                other.outgoing.retain(|back| back.node != node);
            }
        }
        self.unindex(node, &data.props);
        true
    }

    /// Adds an edge unless the same typed edge already exists.
    ///
    /// Returns true if a new edge was created.
    pub fn add_edge(&mut self, start: NodeId, rel: RelType, end: NodeId, homotypic: bool) -> bool {
        if !self.contains(start) || !self.contains(end) {
            return false;
        }
        let exists = self
            .data(start)
            .is_some_and(|data| data.outgoing.iter().any(|l| l.rel == rel && l.node == end));
        if exists {
            return false;
        }
        if let Some(data) = self.data_mut(start) {
            data.outgoing.push(Link {
                rel,
                node: end,
                homotypic,
            });
        }
        if let Some(data) = self.data_mut(end) {
            data.incoming.push(Link {
                rel,
                node: start,
                homotypic,
            });
        }
        true
    }

    pub fn remove_edge(&mut self, start: NodeId, rel: RelType, end: NodeId) -> bool {
        let mut removed = false;
        if let Some(data) = self.data_mut(start) {
            let before = data.outgoing.len();
            data.outgoing.retain(|l| !(l.rel == rel && l.node == end));
            removed = before != data.outgoing.len();
        }
        if let Some(data) = self.data_mut(end) {
            data.incoming.retain(|l| !(l.rel == rel && l.node == start));
        }
        removed
    }

    pub fn outgoing(&self, node: NodeId, rel: RelType) -> Vec<Edge> {
        self.data(node)
            .map(|data| {
                data.outgoing
                    .iter()
                    .filter(|l| l.rel == rel)
                    .map(|l| Edge {
                        start: node,
                        rel,
                        end: l.node,
                        homotypic: l.homotypic,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn incoming(&self, node: NodeId, rel: RelType) -> Vec<Edge> {
        self.data(node)
            .map(|data| {
                data.incoming
                    .iter()
                    .filter(|l| l.rel == rel)
                    .map(|l| Edge {
                        start: l.node,
                        rel,
                        end: node,
                        homotypic: l.homotypic,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All live nodes in storage order, optionally restricted to one label.
    pub fn node_ids(&self, label: Option<Label>) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(move |(idx, slot)| {
            let data = slot.as_ref()?;
            if label.is_some_and(|label| !data.labels.contains(label)) {
                return None;
            }
            Some(NodeId::new(idx as u64))
        })
    }

    pub fn nodes_by_id(&self, id: &str) -> &[NodeId] {
        self.by_id.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn nodes_by_canonical(&self, canonical: &str) -> &[NodeId] {
        self.by_canonical.get(canonical).map_or(&[], Vec::as_slice)
    }

    /// Rebuilds the lookup indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.by_id.clear();
        self.by_canonical.clear();
        let entries: Vec<(NodeId, NodeProps)> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                slot.as_ref()
                    .map(|data| (NodeId::new(idx as u64), data.props.clone()))
            })
            .collect();
        for (node, props) in entries {
            self.index(node, &props);
        }
    }

    fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.nodes.get(node.index()).and_then(Option::as_ref)
    }

    fn data_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.index()).and_then(Option::as_mut)
    }

    fn index(&mut self, node: NodeId, props: &NodeProps) {
        if let Some(id) = &props.id {
            self.by_id.entry(id.clone()).or_default().push(node);
        }
        if let Some(canonical) = &props.canonical_name {
            self.by_canonical
                .entry(canonical.clone())
                .or_default()
                .push(node);
        }
    }

    fn unindex(&mut self, node: NodeId, props: &NodeProps) {
        if let Some(id) = &props.id {
            remove_from(&mut self.by_id, id, node);
        }
        if let Some(canonical) = &props.canonical_name {
            remove_from(&mut self.by_canonical, canonical, node);
        }
    }
}

fn remove_from(index: &mut HashMap<String, Vec<NodeId>>, key: &str, node: NodeId) {
    if let Some(nodes) = index.get_mut(key) {
        nodes.retain(|n| *n != node);
        if nodes.is_empty() {
            index.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(id: &str, canonical: &str) -> NodeProps {
        NodeProps {
            id: Some(id.to_string()),
            canonical_name: Some(canonical.to_string()),
            ..NodeProps::default()
        }
    }

    #[test]
    fn test_indices_follow_props() {
        let mut graph = Graph::new();
        let node = graph.create_node(Labels::from(&[Label::Taxon][..]));
        graph.set_props(node, props("1", "Abies alba"));
        assert_eq!(graph.nodes_by_id("1"), &[node]);
        graph.set_props(node, props("2", "Abies alba"));
        assert!(graph.nodes_by_id("1").is_empty());
        assert_eq!(graph.nodes_by_canonical("Abies alba"), &[node]);
    }

    #[test]
    fn test_delete_removes_incident_edges() {
        let mut graph = Graph::new();
        let parent = graph.create_node(Labels::empty());
        let child = graph.create_node(Labels::empty());
        let synonym = graph.create_node(Labels::empty());
        assert!(graph.add_edge(parent, RelType::ParentOf, child, false));
        assert!(!graph.add_edge(parent, RelType::ParentOf, child, false));
        assert!(graph.add_edge(synonym, RelType::SynonymOf, child, true));

        assert!(graph.delete_node(child));
        assert!(!graph.contains(child));
        assert!(graph.outgoing(parent, RelType::ParentOf).is_empty());
        assert!(graph.outgoing(synonym, RelType::SynonymOf).is_empty());
        assert_eq!(graph.len(), 2);

        let next = graph.create_node(Labels::empty());
        assert_ne!(next, child);
    }

    #[test]
    fn test_node_ids_by_label() {
        let mut graph = Graph::new();
        let taxon = graph.create_node(Labels::from(&[Label::Name, Label::Taxon][..]));
        let synonym = graph.create_node(Labels::from(&[Label::Name, Label::Synonym][..]));
        let all: Vec<_> = graph.node_ids(None).collect();
        assert_eq!(all, vec![taxon, synonym]);
        let synonyms: Vec<_> = graph.node_ids(Some(Label::Synonym)).collect();
        assert_eq!(synonyms, vec![synonym]);
    }
}
