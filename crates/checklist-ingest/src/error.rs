//! Error types for checklist ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering and reading source files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// The csv parser failed on a data file.
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // === Source Validation Errors ===
    /// The source cannot be imported at all.
    #[error("source invalid: {reason}")]
    SourceInvalid { reason: String },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::DirectoryNotFound {
            path: PathBuf::from("/data/acef"),
        };
        assert_eq!(err.to_string(), "directory not found: /data/acef");
        let err = IngestError::SourceInvalid {
            reason: "no data files found".to_string(),
        };
        assert_eq!(err.to_string(), "source invalid: no data files found");
    }
}
