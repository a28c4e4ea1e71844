//! Import options.

use checklist_ingest::ReaderOptions;
use checklist_model::NomCode;

/// Default number of nodes processed between commit callbacks.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Options for importing one source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Nodes per batch during relation resolution.
    /// Defaults to 10 000.
    pub batch_size: usize,

    /// Options passed on to the schema discovery reader.
    pub reader: ReaderOptions,

    /// Nomenclatural code applied to every parsed name, if known.
    pub code: Option<NomCode>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            reader: ReaderOptions::default(),
            code: None,
        }
    }
}

impl ImportOptions {
    /// Set the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the reader options.
    #[must_use]
    pub fn with_reader(mut self, reader: ReaderOptions) -> Self {
        self.reader = reader;
        self
    }

    /// Set the nomenclatural code.
    #[must_use]
    pub fn with_code(mut self, code: Option<NomCode>) -> Self {
        self.code = code;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_is_at_least_one() {
        let options = ImportOptions::default().with_batch_size(0);
        assert_eq!(options.batch_size, 1);
        assert_eq!(ImportOptions::default().batch_size, DEFAULT_BATCH_SIZE);
    }
}
