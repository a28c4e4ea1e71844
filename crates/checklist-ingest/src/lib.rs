//! Discovery and streaming of delimited checklist files.

pub mod encoding;
pub mod error;
pub mod format;
pub mod normalize;
pub mod options;
pub mod reader;
pub mod schema;
pub mod stream;

// === Discovery ===
pub use encoding::{Charset, DecodingReader, detect_charset, detect_charset_bytes, open_decoded};
pub use format::{CsvFormat, FormatScore, discover_format, score_format, sniff_format};
pub use options::{DATA_FILE_SUFFIXES, ReaderOptions};
pub use reader::{DATA_SUBFOLDER, SchemaReader, list_data_files};
pub use schema::{Field, Schema};

// === Records ===
pub use normalize::clean;
pub use stream::RecordStream;

// === Errors ===
pub use error::{IngestError, Result};
