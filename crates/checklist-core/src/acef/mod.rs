//! Annual Checklist Exchange Format (ACEF) support.

pub mod inserter;
pub mod interpreter;
pub mod reader;

pub use inserter::AcefInserter;
pub use interpreter::{ACEF_AUTHOR_MAX, AcefInterpreter, parse_date};
pub use reader::{ACEF_ROW_TYPES, ACEF_SUBFOLDER, acef_options, open_acef};
