//! Normalization of ACEF checklists into the staging store.
//!
//! [`import_acef`] discovers the data files of a source folder, stages
//! every usage and reference in a first phase and resolves parent,
//! synonym and reference relations in a second one. Problems found on the
//! way are recorded as issues on the staged objects and never abort the
//! import.
//!
//! ```no_run
//! use checklist_core::{ImportOptions, import_acef};
//! use checklist_store::{StagingStore, StoreConfig};
//!
//! let mut store = StagingStore::open(StoreConfig::in_memory())?;
//! let summary = import_acef("data/source", &mut store, &ImportOptions::default())?;
//! println!("{} taxa", summary.taxa);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod acef;
pub mod error;
pub mod import;
pub mod linker;
pub mod options;
pub mod resolver;
pub mod summary;

// === Import ===
pub use import::import_acef;
pub use options::{DEFAULT_BATCH_SIZE, ImportOptions};
pub use summary::{ImportSummary, InsertCounts, RowTypeCount};

// === ACEF ===
pub use acef::{
    ACEF_ROW_TYPES, ACEF_SUBFOLDER, AcefInserter, AcefInterpreter, acef_options, open_acef,
};

// === Relations ===
pub use linker::{LinkStats, ReferenceLinkType, link_references};
pub use resolver::{RelationResolver, ResolverStats};

// === Errors ===
pub use error::{NormalizationError, Phase, Result};
