//! Lazy streaming of raw records from one schema.

use std::collections::BTreeMap;
use std::fs::File;
use std::sync::Arc;

use checklist_model::{HasIssues, Issue, RawRecord};

use crate::encoding::{DecodingReader, open_decoded};
use crate::error::{IngestError, Result};
use crate::normalize::clean;
use crate::schema::Schema;

/// A single-pass iterator over the records of one file.
///
/// The header row is consumed on open. A short row is joined with the rows
/// following it while the combined cells still fit the mapped columns; the
/// cell at the seam is glued with a newline, which undoes stray line breaks
/// inside unquoted values. Rows that stay empty or too short are skipped and
/// never surface as records; the record following such rows carries
/// `PREVIOUS_LINE_SKIPPED`.
pub struct RecordStream {
    inner: Option<StreamState>,
}

struct StreamState {
    schema: Arc<Schema>,
    file_name: String,
    records: csv::StringRecordsIntoIter<DecodingReader<File>>,
    min_columns: usize,
    queued: Option<csv::StringRecord>,
    previous_skipped: bool,
    skipped: usize,
    emitted: usize,
}

impl RecordStream {
    /// A stream yielding nothing, used for row types without a schema.
    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub(crate) fn open(schema: Arc<Schema>) -> Result<Self> {
        let decoded = open_decoded(&schema.file, schema.charset)?;
        let mut records = schema
            .format
            .reader_builder()
            .from_reader(decoded)
            .into_records();
        // header row
        if let Some(Err(source)) = records.next() {
            return Err(IngestError::Csv {
                path: schema.file.clone(),
                source,
            });
        }
        let min_columns = schema.max_index().map_or(0, |max| max + 1);
        Ok(Self {
            inner: Some(StreamState {
                file_name: schema.file_name(),
                schema,
                records,
                min_columns,
                queued: None,
                previous_skipped: false,
                skipped: 0,
                emitted: 0,
            }),
        })
    }

    /// Number of rows skipped so far.
    pub fn skipped(&self) -> usize {
        self.inner.as_ref().map_or(0, |state| state.skipped)
    }

    /// Number of records produced so far.
    pub fn emitted(&self) -> usize {
        self.inner.as_ref().map_or(0, |state| state.emitted)
    }
}

impl StreamState {
    /// Reads the next row, joining short rows with their successors.
    ///
    /// The line reported is the one the row started on. A successor that
    /// would overflow the column count is queued for the next call.
    fn read_complete_row(&mut self) -> Option<csv::Result<(csv::StringRecord, u64)>> {
        let mut row = match self.queued.take() {
            Some(row) => row,
            None => match self.records.next()? {
                Ok(row) => row,
                Err(err) => return Some(Err(err)),
            },
        };
        let line = row.position().map_or(0, csv::Position::line);
        while row.len() > 1 && row.len() < self.min_columns {
            let next = match self.records.next() {
                Some(Ok(next)) => next,
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            };
            if row.len() + next.len() - 1 > self.min_columns {
                self.queued = Some(next);
                break;
            }
            row = join_rows(&row, &next);
            tracing::debug!(file = %self.file_name, line, columns = row.len(), "join split row");
        }
        Some(Ok((row, line)))
    }

    fn build_record(&self, row: &csv::StringRecord, line: u64) -> RawRecord {
        let mut values = BTreeMap::new();
        for field in &self.schema.columns {
            if field.term.is_unknown() {
                continue;
            }
            let value = field
                .index
                .and_then(|idx| row.get(idx))
                .and_then(clean)
                .or_else(|| field.default_value.clone());
            if let Some(value) = value {
                values.insert(field.term.clone(), value);
            }
        }
        RawRecord::new(self.file_name.clone(), line, self.schema.row_type.clone(), values)
    }

    fn skip(&mut self, line: u64, reason: &'static str, columns: usize) {
        self.skipped += 1;
        self.previous_skipped = true;
        if columns == 0 {
            tracing::debug!(file = %self.file_name, line, reason, "skip row");
        } else {
            tracing::info!(
                file = %self.file_name,
                line,
                columns,
                expected = self.min_columns,
                reason,
                "skip row"
            );
        }
    }
}

fn join_rows(head: &csv::StringRecord, tail: &csv::StringRecord) -> csv::StringRecord {
    let mut joined = csv::StringRecord::with_capacity(
        head.as_slice().len() + tail.as_slice().len() + 1,
        head.len() + tail.len(),
    );
    let mut tail_cells = tail.iter();
    let seam = head.len().saturating_sub(1);
    for (idx, cell) in head.iter().enumerate() {
        if idx == seam {
            match tail_cells.next() {
                Some(first) if !first.is_empty() => {
                    joined.push_field(&format!("{cell}\n{first}"));
                }
                _ => joined.push_field(cell),
            }
        } else {
            joined.push_field(cell);
        }
    }
    for cell in tail_cells {
        joined.push_field(cell);
    }
    joined
}

impl Iterator for RecordStream {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.inner.as_mut()?;
        loop {
            let (row, line) = match state.read_complete_row()? {
                Ok(read) => read,
                Err(source) => {
                    let path = state.schema.file.clone();
                    self.inner = None;
                    return Some(Err(IngestError::Csv { path, source }));
                }
            };
            if row.iter().all(|cell| clean(cell).is_none()) {
                state.skip(line, "empty row", 0);
                continue;
            }
            if row.len() < state.min_columns {
                state.skip(line, "too few columns", row.len());
                continue;
            }
            let mut record = state.build_record(&row, line);
            if state.previous_skipped {
                record.add_issue(Issue::PreviousLineSkipped);
                state.previous_skipped = false;
            }
            state.emitted += 1;
            return Some(Ok(record));
        }
    }
}
