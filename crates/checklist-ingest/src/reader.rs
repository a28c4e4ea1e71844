//! Schema discovery over a folder of delimited text files.
//!
//! Every file with a recognized suffix found directly in the folder, in a
//! `data/` subfolder or in the configured format subfolder is inspected:
//! charset detection, delimiter and quote discovery, header mapping and row
//! type detection. Files that cannot be mapped are skipped with a warning.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use checklist_model::{Term, TermRegistry};

use crate::encoding::{Charset, detect_charset, open_decoded};
use crate::error::{IngestError, Result};
use crate::format::discover_format;
use crate::normalize::clean;
use crate::options::{DATA_FILE_SUFFIXES, ReaderOptions};
use crate::schema::{Field, Schema, file_name};
use crate::stream::RecordStream;

/// Subfolder conventionally holding the data files of an archive.
pub const DATA_SUBFOLDER: &str = "data";

/// Discovered schemas of one source folder, keyed by row type.
#[derive(Debug, Clone)]
pub struct SchemaReader {
    folder: PathBuf,
    registry: TermRegistry,
    options: ReaderOptions,
    schemas: BTreeMap<Term, Arc<Schema>>,
}

impl SchemaReader {
    /// Discovers all mappable files below `folder`.
    ///
    /// # Errors
    ///
    /// Fails when the folder does not exist, a data file cannot be read, or
    /// no file yields a usable schema.
    pub fn from_folder(
        folder: impl AsRef<Path>,
        registry: TermRegistry,
        options: ReaderOptions,
    ) -> Result<Self> {
        let folder = folder.as_ref().to_path_buf();
        let mut reader = Self {
            folder,
            registry,
            options,
            schemas: BTreeMap::new(),
        };
        for path in reader.data_files()? {
            if let Some(schema) = reader.build_schema(&path)? {
                reader.insert_schema(schema);
            }
        }
        reader.validate()?;
        tracing::info!(
            folder = %reader.folder.display(),
            schemas = reader.schemas.len(),
            "discovered source schemas"
        );
        Ok(reader)
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn registry(&self) -> &TermRegistry {
        &self.registry
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn schema(&self, row_type: &Term) -> Option<&Schema> {
        self.schemas.get(row_type).map(Arc::as_ref)
    }

    pub fn has_schema(&self, row_type: &Term) -> bool {
        self.schemas.contains_key(row_type)
    }

    pub fn row_types(&self) -> impl Iterator<Item = &Term> {
        self.schemas.keys()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values().map(Arc::as_ref)
    }

    // === Validation Hooks ===

    /// Fails if no schema is left at all.
    pub fn validate(&self) -> Result<()> {
        if self.schemas.is_empty() {
            return Err(IngestError::SourceInvalid {
                reason: format!("no data files found in {}", self.folder.display()),
            });
        }
        Ok(())
    }

    /// Drops the schema of `row_type` unless it maps `term`.
    ///
    /// Returns whether a schema for the row type remains.
    pub fn require(&mut self, row_type: &Term, term: impl Into<Term>) -> bool {
        let term = term.into();
        self.require_one(row_type, std::slice::from_ref(&term))
    }

    /// Drops the schema of `row_type` unless it maps at least one of `terms`.
    pub fn require_one(&mut self, row_type: &Term, terms: &[Term]) -> bool {
        let Some(schema) = self.schemas.get(row_type) else {
            return false;
        };
        if terms.iter().any(|term| schema.has_term(term)) {
            return true;
        }
        let missing: Vec<String> = terms.iter().map(Term::to_string).collect();
        tracing::warn!(
            row_type = %row_type,
            file = %schema.file.display(),
            missing = %missing.join(" | "),
            "required field missing, dropping schema"
        );
        self.schemas.remove(row_type);
        false
    }

    /// Returns the schema of `row_type`, failing the whole source if absent.
    pub fn require_schema(&self, row_type: &Term) -> Result<&Schema> {
        self.schema(row_type)
            .ok_or_else(|| IngestError::SourceInvalid {
                reason: format!("required data file {row_type} missing"),
            })
    }

    /// Keeps only schemas matching `keep`, logging every removal.
    pub fn filter_schemas(&mut self, mut keep: impl FnMut(&Schema) -> bool) {
        self.schemas.retain(|row_type, schema| {
            let retained = keep(schema);
            if !retained {
                tracing::info!(
                    row_type = %row_type,
                    file = %schema.file.display(),
                    "ignoring data file outside the accepted vocabulary"
                );
            }
            retained
        });
    }

    /// Lists and logs the given row types that have no schema.
    pub fn report_missing_schemas(&self, row_types: &[Term]) -> Vec<Term> {
        let missing: Vec<Term> = row_types
            .iter()
            .filter(|row_type| !self.has_schema(row_type))
            .cloned()
            .collect();
        for row_type in &missing {
            tracing::info!(row_type = %row_type, "no data file for row type");
        }
        missing
    }

    /// Adds a default value for `term` to the schema of `row_type`.
    ///
    /// A mapped column keeps its index and falls back to the default when
    /// empty. Returns false if there is no such schema.
    pub fn add_default(&mut self, row_type: &Term, term: impl Into<Term>, value: &str) -> bool {
        let Some(schema) = self.schemas.get_mut(row_type) else {
            return false;
        };
        let term = term.into();
        let schema = Arc::make_mut(schema);
        match schema.columns.iter_mut().find(|field| field.term == term) {
            Some(field) => field.default_value = Some(value.to_string()),
            None => schema.columns.push(Field::constant(term, value)),
        }
        true
    }

    // === Streaming ===

    /// Opens a lazy record stream for `row_type`, empty if there is no schema.
    pub fn stream(&self, row_type: &Term) -> Result<RecordStream> {
        match self.schemas.get(row_type) {
            Some(schema) => RecordStream::open(Arc::clone(schema)),
            None => {
                tracing::debug!(row_type = %row_type, "no schema to stream");
                Ok(RecordStream::empty())
            }
        }
    }

    // === Discovery ===

    fn data_files(&self) -> Result<Vec<PathBuf>> {
        if !self.folder.is_dir() {
            return Err(IngestError::DirectoryNotFound {
                path: self.folder.clone(),
            });
        }
        let mut files = list_data_files(&self.folder)?;
        let mut subfolders = vec![DATA_SUBFOLDER.to_string()];
        subfolders.extend(self.options.subfolder.clone());
        for sub in subfolders {
            let dir = self.folder.join(&sub);
            if dir.is_dir() {
                files.extend(list_data_files(&dir)?);
            }
        }
        Ok(files)
    }

    fn build_schema(&self, path: &Path) -> Result<Option<Schema>> {
        let charset = detect_charset(path, self.options.sniff_window)?;
        let sample = self.read_sample(path, charset)?;
        if sample.lines().filter(|line| !line.trim().is_empty()).count() < 2 {
            tracing::warn!(path = %path.display(), "file has no data rows, skipping");
            return Ok(None);
        }
        if contains_markup(&sample) {
            tracing::info!(path = %path.display(), "contains no tabular data, skipping");
            return Ok(None);
        }
        let format = discover_format(&sample, &self.options.delimiters, &self.options.quotes);

        let prefix = self.options.term_prefix.as_deref();
        let header = format
            .reader_builder()
            .from_reader(sample.as_bytes())
            .records()
            .next()
            .and_then(std::result::Result::ok)
            .unwrap_or_default();
        let mut columns = Vec::new();
        for (index, cell) in header.iter().enumerate() {
            let Some(name) = clean(cell) else {
                continue;
            };
            let name = name.replace(' ', "_");
            columns.push(Field::column(self.registry.resolve_property(prefix, &name), index));
        }

        let unknown = columns.iter().filter(|field| field.term.is_unknown()).count();
        if unknown == columns.len() {
            tracing::warn!(path = %path.display(), "no header column maps to a known term, skipping");
            return Ok(None);
        }
        let ratio = unknown as f64 / columns.len() as f64;
        if ratio > self.options.unknown_term_warn_ratio {
            tracing::warn!(
                path = %path.display(),
                unknown,
                columns = columns.len(),
                "most header columns are unknown terms"
            );
        }

        let Some(row_type) = self.detect_row_type(path) else {
            tracing::warn!(path = %path.display(), "file name does not name a row type, skipping");
            return Ok(None);
        };

        tracing::debug!(
            path = %path.display(),
            row_type = %row_type,
            charset = %charset,
            format = %format,
            columns = columns.len(),
            unknown,
            "mapped data file"
        );
        Ok(Some(Schema {
            file: path.to_path_buf(),
            row_type,
            charset,
            format,
            columns,
        }))
    }

    fn read_sample(&self, path: &Path, charset: Charset) -> Result<String> {
        let reader = BufReader::new(open_decoded(path, charset)?);
        let mut sample = String::new();
        for line in reader.lines().take(self.options.sample_lines.max(2)) {
            let line = line.map_err(|source| IngestError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
            sample.push_str(&line);
            sample.push('\n');
        }
        Ok(sample)
    }

    /// Resolves a file's base name to a class term.
    fn detect_row_type(&self, path: &Path) -> Option<Term> {
        let stem = path.file_stem()?.to_str()?.trim();
        let prefix = self.options.term_prefix.as_deref();
        let mut candidates = vec![stem.to_string()];
        if let Some(singular) = stem.strip_suffix('s').or_else(|| stem.strip_suffix('S')) {
            candidates.push(singular.to_string());
        }
        let lower = stem.to_lowercase();
        if let Some(base) = lower.strip_suffix("taxa") {
            candidates.push(format!("{base}taxon"));
        }
        candidates
            .iter()
            .find_map(|name| self.registry.find_class(prefix, name))
            .cloned()
    }

    fn insert_schema(&mut self, schema: Schema) {
        let row_type = schema.row_type.clone();
        match self.schemas.get(&row_type) {
            Some(existing)
                if schema.file_matches_row_type() && !existing.file_matches_row_type() =>
            {
                tracing::info!(
                    row_type = %row_type,
                    replaced = %existing.file.display(),
                    file = %schema.file.display(),
                    "replacing schema"
                );
            }
            Some(existing) => {
                tracing::info!(
                    row_type = %row_type,
                    kept = %existing.file.display(),
                    file = %schema.file.display(),
                    "row type already mapped, skipping file"
                );
                return;
            }
            None => {}
        }
        self.schemas.insert(row_type, Arc::new(schema));
    }
}

/// True when a sample looks like an HTML page rather than a table.
fn contains_markup(sample: &str) -> bool {
    sample.lines().any(|line| {
        let line = line.to_lowercase();
        line.contains("<!doctype ") || line.contains("<html>")
    })
}

/// Lists data files directly inside `dir`, sorted by file name.
pub fn list_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                DATA_FILE_SUFFIXES
                    .iter()
                    .any(|suffix| ext.eq_ignore_ascii_case(suffix))
            });
        if recognized {
            files.push(path);
        } else {
            tracing::trace!(file = %file_name(&path), "ignoring file with unrecognized suffix");
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
