//! On-disk format of the graph half of a store.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::graph::Graph;

/// Magic bytes of a graph file.
pub const MAGIC_BYTES: [u8; 4] = *b"CKG\x01";

/// Current graph file version.
pub const CURRENT_VERSION: u32 = 1;

/// Graph arena together with the counters and indices that live beside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphState {
    pub graph: Graph,
    /// Reference id to payload key.
    pub references: BTreeMap<String, u64>,
    pub next_verbatim: u64,
    pub next_reference: u64,
}

/// Writes the state via a temp file and rename.
///
/// Format:
/// - 4 bytes: magic
/// - 4 bytes: version (u32 little-endian)
/// - N bytes: bincode payload
pub fn save_state(state: &GraphState, path: &Path) -> Result<()> {
    let body = bincode::serialize(state).map_err(|source| StoreError::Codec {
        operation: "encode",
        what: "graph",
        source,
    })?;
    let mut bytes = Vec::with_capacity(8 + body.len());
    bytes.extend_from_slice(&MAGIC_BYTES);
    bytes.extend_from_slice(&CURRENT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&body);

    let temp_path = path.with_extension("bin.tmp");
    let mut file = File::create(&temp_path).map_err(|e| StoreError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(&bytes).map_err(|e| StoreError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;
    file.sync_all().map_err(|e| StoreError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;
    fs::rename(&temp_path, path).map_err(|e| StoreError::Io {
        operation: "rename",
        path: temp_path.clone(),
        source: e,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved graph");
    Ok(())
}

/// Reads a state written by [`save_state`] and rebuilds its indices.
pub fn load_state(path: &Path) -> Result<GraphState> {
    let bytes = fs::read(path).map_err(|e| StoreError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;
    if bytes.len() < 8 || bytes[0..4] != MAGIC_BYTES {
        return Err(StoreError::InvalidGraphFile {
            path: path.to_path_buf(),
            reason: "missing magic bytes".to_string(),
        });
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&bytes[4..8]);
    let version = u32::from_le_bytes(version);
    if version > CURRENT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: version,
            max_supported: CURRENT_VERSION,
        });
    }
    let mut state: GraphState =
        bincode::deserialize(&bytes[8..]).map_err(|source| StoreError::Codec {
            operation: "decode",
            what: "graph",
            source,
        })?;
    state.graph.rebuild_indices();
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Label, Labels, NodeProps};
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        let mut state = GraphState::default();
        let node = state.graph.create_node(Labels::from(&[Label::Taxon][..]));
        state.graph.set_props(
            node,
            NodeProps {
                id: Some("t1".into()),
                ..NodeProps::default()
            },
        );
        state.references.insert("r1".into(), 0);
        state.next_reference = 1;

        save_state(&state, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &MAGIC_BYTES);

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.graph.nodes_by_id("t1"), &[node]);
        assert_eq!(loaded.references.get("r1"), Some(&0));
        assert_eq!(loaded.next_reference, 1);
    }

    #[test]
    fn test_load_rejects_foreign_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.bin");
        fs::write(&path, b"not a graph").unwrap();
        assert!(matches!(
            load_state(&path),
            Err(StoreError::InvalidGraphFile { .. })
        ));
    }
}
