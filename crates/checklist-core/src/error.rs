//! Error types for source normalization.

use checklist_ingest::IngestError;
use checklist_store::StoreError;
use thiserror::Error;

/// Inserter phases, in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    BatchInsert,
    PostBatchInsert,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BatchInsert => "batch insert",
            Phase::PostBatchInsert => "post batch insert",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors aborting the import of a whole source.
#[derive(Debug, Error)]
pub enum NormalizationError {
    /// The source folder cannot be imported at all.
    #[error(transparent)]
    Source(#[from] IngestError),

    /// An unexpected failure while running an inserter phase.
    #[error("normalization failed during {phase}: {source}")]
    NormalizationFailed {
        phase: Phase,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A phase was called out of order or twice.
    #[error("{phase} called out of order")]
    PhaseOrder { phase: Phase },

    /// The staging store failed outside of an inserter phase.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl NormalizationError {
    pub fn failed(phase: Phase, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::NormalizationFailed {
            phase,
            source: Box::new(source),
        }
    }
}

/// Result type for normalization.
pub type Result<T> = std::result::Result<T, NormalizationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_display() {
        let err = NormalizationError::PhaseOrder {
            phase: Phase::PostBatchInsert,
        };
        assert_eq!(err.to_string(), "post batch insert called out of order");
    }

    #[test]
    fn test_failed_wraps_source() {
        let err = NormalizationError::failed(Phase::BatchInsert, StoreError::Closed);
        assert_eq!(
            err.to_string(),
            "normalization failed during batch insert: store is closed"
        );
    }
}
