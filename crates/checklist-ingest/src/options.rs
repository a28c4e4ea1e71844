//! Tunables of the schema discovery reader.

use crate::encoding::DEFAULT_SNIFF_WINDOW;
use crate::format::{DEFAULT_DELIMITERS, DEFAULT_QUOTES};

/// File suffixes recognized as delimited text.
pub const DATA_FILE_SUFFIXES: [&str; 7] = ["csv", "tsv", "tab", "txt", "text", "archive", "dwca"];

/// Options for discovering and reading source files.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderOptions {
    /// Preferred term namespace tried first for header cells and file names.
    pub term_prefix: Option<String>,

    /// Format-named subfolder searched in addition to the root and `data/`.
    pub subfolder: Option<String>,

    /// Delimiters tried during format discovery.
    /// Defaults to tab, comma, semicolon and pipe.
    pub delimiters: Vec<u8>,

    /// Quote characters tried during format discovery, `None` meaning unquoted.
    /// Defaults to none, double quote and single quote.
    pub quotes: Vec<Option<u8>>,

    /// Number of leading lines parsed during format discovery.
    /// Defaults to 20.
    pub sample_lines: usize,

    /// Number of leading bytes inspected for charset detection.
    /// Defaults to 8 KiB.
    pub sniff_window: usize,

    /// Share of unknown header terms above which a warning is logged.
    /// Defaults to 0.8.
    pub unknown_term_warn_ratio: f64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            term_prefix: None,
            subfolder: None,
            delimiters: DEFAULT_DELIMITERS.to_vec(),
            quotes: DEFAULT_QUOTES.to_vec(),
            sample_lines: 20,
            sniff_window: DEFAULT_SNIFF_WINDOW,
            unknown_term_warn_ratio: 0.8,
        }
    }
}

impl ReaderOptions {
    /// Set the preferred term namespace.
    #[must_use]
    pub fn with_term_prefix(mut self, prefix: Option<String>) -> Self {
        self.term_prefix = prefix;
        self
    }

    /// Set the format-named subfolder.
    #[must_use]
    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = Some(subfolder.into());
        self
    }

    /// Set the delimiter candidates.
    #[must_use]
    pub fn with_delimiters(mut self, delimiters: Vec<u8>) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Set the quote candidates.
    #[must_use]
    pub fn with_quotes(mut self, quotes: Vec<Option<u8>>) -> Self {
        self.quotes = quotes;
        self
    }

    /// Set the number of lines used for format discovery.
    #[must_use]
    pub fn with_sample_lines(mut self, lines: usize) -> Self {
        self.sample_lines = lines;
        self
    }

    /// Set the unknown header warning ratio.
    #[must_use]
    pub fn with_unknown_term_warn_ratio(mut self, ratio: f64) -> Self {
        self.unknown_term_warn_ratio = ratio;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert_eq!(options.delimiters, vec![b'\t', b',', b';', b'|']);
        assert_eq!(options.quotes, vec![None, Some(b'"'), Some(b'\'')]);
        assert_eq!(options.sample_lines, 20);
        assert!((options.unknown_term_warn_ratio - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builders() {
        let options = ReaderOptions::default()
            .with_term_prefix(Some("acef".into()))
            .with_subfolder("acef")
            .with_sample_lines(5)
            .with_unknown_term_warn_ratio(0.5);
        assert_eq!(options.term_prefix.as_deref(), Some("acef"));
        assert_eq!(options.subfolder.as_deref(), Some("acef"));
        assert_eq!(options.sample_lines, 5);
    }
}
