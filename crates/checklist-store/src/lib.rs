//! Staging store for normalized checklist data.
//!
//! A node arena with typed edges and lookup indices, paired with a SQLite
//! backed payload store holding the full bincode-encoded domain objects.

pub mod codec;
pub mod error;
pub mod graph;
pub mod node;
pub mod payload;
pub mod persist;
pub mod store;

// === Graph ===
pub use graph::Graph;
pub use node::{Edge, Label, Labels, NodeId, NodeProps, RelType};

// === Store ===
pub use codec::{Codec, CodecPool, PooledCodec};
pub use payload::{PayloadKind, PayloadStore};
pub use store::{
    GRAPH_FILE, NodeBatchProcessor, PAYLOAD_FILE, StagedPayload, StagingStore, StoreConfig,
};

// === Errors ===
pub use error::{Result, StoreError};
