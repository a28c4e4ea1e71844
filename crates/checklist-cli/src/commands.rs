//! Command implementations.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use checklist_core::{ImportOptions, ImportSummary, acef_options, import_acef};
use checklist_ingest::{ReaderOptions, SchemaReader};
use checklist_model::{NomCode, TermRegistry};
use checklist_store::{StagingStore, StoreConfig};
use tracing::info_span;

use crate::cli::{ImportArgs, ReaderArgs, SchemaArgs};

/// Reader options from the shared reader flags.
pub fn reader_options(args: &ReaderArgs) -> ReaderOptions {
    let mut options = ReaderOptions::default().with_term_prefix(args.prefix.clone());
    if let Some(ratio) = args.unknown_ratio {
        options = options.with_unknown_term_warn_ratio(ratio);
    }
    options
}

/// Import options from the import flags.
///
/// # Errors
///
/// Fails on an unknown nomenclatural code.
pub fn import_options(args: &ImportArgs) -> Result<ImportOptions> {
    let code = args
        .code
        .as_deref()
        .map(str::parse::<NomCode>)
        .transpose()
        .map_err(|message| anyhow!(message))?;
    let mut options = ImportOptions::default()
        .with_reader(reader_options(&args.reader))
        .with_code(code);
    if let Some(batch_size) = args.batch_size {
        options = options.with_batch_size(batch_size);
    }
    Ok(options)
}

pub fn run_import(args: &ImportArgs) -> Result<ImportSummary> {
    let folder = &args.reader.folder;
    let options = import_options(args)?;
    let config = match &args.store_dir {
        Some(dir) => StoreConfig::default().with_dir(dir),
        None => StoreConfig::in_memory(),
    };
    let mut store = StagingStore::open(config).context("open staging store")?;
    let summary = import_acef(folder, &mut store, &options)
        .with_context(|| format!("import {}", folder.display()))?;
    store.close();
    Ok(summary)
}

/// Discovers the data files of a folder without validating them as a source.
pub fn run_schema(args: &SchemaArgs) -> Result<SchemaReader> {
    let folder: &Path = &args.reader.folder;
    let span = info_span!("schema", folder = %folder.display());
    let _guard = span.enter();
    let options = acef_options(reader_options(&args.reader));
    SchemaReader::from_folder(folder, TermRegistry::acef(), options)
        .with_context(|| format!("read schemas of {}", folder.display()))
}
