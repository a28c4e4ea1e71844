//! Delimiter and quote discovery by trial parsing.
//!
//! A text sample is parsed with every candidate configuration. Candidates
//! producing a varying column count across non-empty rows are disqualified.
//! Among the rest the one with the most columns wins, ties going to the
//! smallest total cell length (delimiters hidden in unquoted text make
//! cells longer). An automatically sniffed format is the default winner.

use std::fmt;

/// Delimiters tried by default.
pub const DEFAULT_DELIMITERS: [u8; 4] = [b'\t', b',', b';', b'|'];

/// Quote characters tried by default. `None` disables quoting.
pub const DEFAULT_QUOTES: [Option<u8>; 3] = [None, Some(b'"'), Some(b'\'')];

/// Delimiter and quoting of one delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub quote: Option<u8>,
}

impl CsvFormat {
    pub fn new(delimiter: u8, quote: Option<u8>) -> Self {
        Self { delimiter, quote }
    }

    /// Reader builder configured for this format. Rows may vary in length.
    pub fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quoting(self.quote.is_some())
            .quote(self.quote.unwrap_or(b'"'))
            .flexible(true)
            .has_headers(false);
        builder
    }
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self::new(b'\t', Some(b'"'))
    }
}

impl fmt::Display for CsvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delimiter = match self.delimiter {
            b'\t' => "\\t".to_string(),
            other => char::from(other).to_string(),
        };
        match self.quote {
            Some(quote) => write!(f, "delimiter={delimiter} quote={}", char::from(quote)),
            None => write!(f, "delimiter={delimiter} quote=none"),
        }
    }
}

/// Outcome of parsing a sample with one candidate format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatScore {
    /// Column count shared by all non-empty rows, `None` if inconsistent.
    pub columns: Option<usize>,
    pub total_length: usize,
}

/// Parses `sample` with `format` and scores the result.
pub fn score_format(sample: &str, format: CsvFormat) -> FormatScore {
    let mut reader = format.reader_builder().from_reader(sample.as_bytes());
    let mut columns = None;
    let mut total_length = 0usize;
    for result in reader.records() {
        let Ok(record) = result else {
            return FormatScore {
                columns: None,
                total_length,
            };
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        total_length += record.iter().map(|field| field.chars().count()).sum::<usize>();
        match columns {
            None => columns = Some(record.len()),
            Some(expected) if expected != record.len() => {
                return FormatScore {
                    columns: None,
                    total_length,
                };
            }
            Some(_) => {}
        }
    }
    FormatScore {
        columns,
        total_length,
    }
}

/// Guesses a format from character frequencies, the automatic fallback.
///
/// Prefers the punctuation character occurring the same non-zero number of
/// times on every non-empty line, taking the most frequent such character.
pub fn sniff_format(sample: &str) -> CsvFormat {
    let lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    let Some(header) = lines.first() else {
        return CsvFormat::default();
    };
    let mut candidates: Vec<u8> = Vec::new();
    for byte in header.bytes() {
        let is_candidate = byte == b'\t' || (byte.is_ascii_punctuation() && byte != b'"' && byte != b'\'');
        if is_candidate && !candidates.contains(&byte) {
            candidates.push(byte);
        }
    }

    let count = |line: &str, byte: u8| line.bytes().filter(|b| *b == byte).count();
    let mut best: Option<(u8, usize)> = None;
    for candidate in &candidates {
        let per_line = count(header, *candidate);
        let consistent = lines.iter().all(|line| count(line, *candidate) == per_line);
        if consistent && best.is_none_or(|(_, n)| per_line > n) {
            best = Some((*candidate, per_line));
        }
    }
    let delimiter = best.map(|(byte, _)| byte).or_else(|| {
        candidates
            .iter()
            .copied()
            .max_by_key(|byte| count(header, *byte))
    });
    CsvFormat::new(delimiter.unwrap_or(b'\t'), Some(b'"'))
}

/// Picks the best format for `sample` among the candidate cross product.
pub fn discover_format(sample: &str, delimiters: &[u8], quotes: &[Option<u8>]) -> CsvFormat {
    let fallback = sniff_format(sample);
    let fallback_score = score_format(sample, fallback);
    let mut best = fallback;
    let (mut max_columns, mut min_length) = match fallback_score.columns {
        Some(columns) => (columns, fallback_score.total_length),
        None => (0, usize::MAX),
    };
    tracing::debug!(format = %fallback, columns = ?fallback_score.columns, "sniffed fallback format");

    for delimiter in delimiters {
        for quote in quotes {
            let format = CsvFormat::new(*delimiter, *quote);
            let score = score_format(sample, format);
            let Some(columns) = score.columns else {
                tracing::trace!(format = %format, "inconsistent column count");
                continue;
            };
            if columns > max_columns || (columns == max_columns && score.total_length < min_length)
            {
                best = format;
                max_columns = columns;
                min_length = score.total_length;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn discover(sample: &str) -> CsvFormat {
        discover_format(sample, &DEFAULT_DELIMITERS, &DEFAULT_QUOTES)
    }

    #[test]
    fn test_discover_tab() {
        let sample = "ID\tGenus\tSpeciesEpithet\n1\tAbies\talba\n2\tPinus\tnigra\n";
        assert_eq!(discover(sample).delimiter, b'\t');
    }

    #[test]
    fn test_discover_prefers_quotes_hiding_delimiters() {
        let sample = "ID,Author\n1,\"Smith, J.\"\n2,\"Miller, K.\"\n";
        let format = discover(sample);
        assert_eq!(format, CsvFormat::new(b',', Some(b'"')));
    }

    #[test]
    fn test_discover_shorter_total_length_wins_ties() {
        let sample = "\"ID\";\"Genus\"\n\"1\";\"Abies\"\n";
        let format = discover(sample);
        assert_eq!(format.delimiter, b';');
        assert_eq!(format.quote, Some(b'"'));
    }

    #[test]
    fn test_inconsistent_candidate_is_disqualified() {
        let sample = "a,b;c\nd;e;f\n";
        assert_eq!(
            score_format(sample, CsvFormat::new(b',', None)).columns,
            None
        );
        assert_eq!(
            score_format(sample, CsvFormat::new(b';', None)).columns,
            None
        );
    }

    #[test]
    fn test_fallback_handles_unlisted_delimiter() {
        let sample = "ID:Genus:SpeciesEpithet\n1:Abies:alba\n2:Pinus:nigra\n";
        let format = discover(sample);
        assert_eq!(format.delimiter, b':');
        assert_eq!(score_format(sample, format).columns, Some(3));
    }

    #[test]
    fn test_empty_rows_are_ignored() {
        let sample = "a,b\n,\n\nc,d\n";
        assert_eq!(
            score_format(sample, CsvFormat::new(b',', None)).columns,
            Some(2)
        );
    }

    proptest! {
        #[test]
        fn prop_winner_parses_consistently(
            delimiter in prop::sample::select(DEFAULT_DELIMITERS.to_vec()),
            columns in 2usize..8,
            rows in prop::collection::vec(prop::collection::vec("[A-Za-z0-9]{1,6}", 8), 2..20),
        ) {
            let separator = char::from(delimiter).to_string();
            let sample: String = rows
                .iter()
                .map(|row| format!("{}\n", row[..columns].join(&separator)))
                .collect();
            let format = discover(&sample);
            prop_assert_eq!(format.delimiter, delimiter);
            prop_assert_eq!(score_format(&sample, format).columns, Some(columns));
        }
    }
}
