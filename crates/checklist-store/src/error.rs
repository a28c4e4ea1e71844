//! Error types for the staging store.

use std::path::PathBuf;

use checklist_model::ModelError;
use thiserror::Error;

use crate::node::NodeId;

/// Staging store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    // === Open/Close Errors ===
    /// File I/O error on the store directory.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The payload database failed.
    #[error("payload store failed to {operation}: {source}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The persisted graph file is not a graph file.
    #[error("invalid graph file {path}: {reason}")]
    InvalidGraphFile { path: PathBuf, reason: String },

    /// The persisted graph file was written by a newer version.
    #[error("graph file version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion { found: u32, max_supported: u32 },

    /// The store was already closed.
    #[error("store is closed")]
    Closed,

    // === Serialization Errors ===
    /// A payload could not be encoded or decoded.
    #[error("failed to {operation} {what}: {source}")]
    Codec {
        operation: &'static str,
        what: &'static str,
        #[source]
        source: bincode::Error,
    },

    // === Lookup Errors ===
    /// A unique index holds more than one node for the key.
    #[error("{index} {key} is not unique ({count} nodes)")]
    NotUnique {
        index: &'static str,
        key: String,
        count: usize,
    },

    /// The node does not exist or was deleted.
    #[error("node {node} not found")]
    NodeNotFound { node: NodeId },

    // === Transaction Errors ===
    /// A transaction was started while another one is open.
    #[error("a transaction is already open")]
    TransactionActive,

    /// A payload violated a domain rule while being read back.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
