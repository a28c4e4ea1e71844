//! Import of a whole ACEF source folder.

use std::path::Path;
use std::time::Instant;

use checklist_store::StagingStore;
use tracing::info_span;

use crate::acef::{AcefInserter, open_acef};
use crate::error::Result;
use crate::options::ImportOptions;
use crate::summary::ImportSummary;

/// Reads the ACEF source in `folder` into `store` and runs both inserter
/// phases.
///
/// # Errors
///
/// Fails when the folder holds no usable `AcceptedSpecies` file or when
/// an inserter phase fails. A failed second phase leaves the store as it
/// was after the first.
pub fn import_acef(
    folder: impl AsRef<Path>,
    store: &mut StagingStore,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let folder = folder.as_ref();
    let start = Instant::now();
    let span = info_span!("import", folder = %folder.display());
    let _guard = span.enter();

    let reader = open_acef(folder, options.reader.clone())?;
    tracing::info!(schemas = reader.schemas().count(), "discovered data files");

    let mut inserter = AcefInserter::new(&reader, store, options);
    inserter.batch_insert()?;
    inserter.post_batch_insert()?;
    let (counts, resolver, links) = inserter.into_stats();

    let mut summary = ImportSummary::collect(store, counts, resolver, links)?;
    summary.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        names = summary.names,
        taxa = summary.taxa,
        synonyms = summary.synonyms,
        references = summary.references,
        issues = summary.issue_total(),
        duration_ms = summary.duration_ms,
        "import complete"
    );
    Ok(summary)
}
