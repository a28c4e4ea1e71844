use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Descriptive metadata of the source dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub title: Option<String>,
    pub alias: Option<String>,
    pub version: Option<String>,
    pub released: Option<NaiveDate>,
    pub authors_and_editors: Option<String>,
    pub taxonomic_coverage: Option<String>,
    pub group_name: Option<String>,
    pub description: Option<String>,
    pub organisation: Option<String>,
    pub website: Option<String>,
    pub contact: Option<String>,
    pub geographic_coverage: Option<String>,
    pub completeness: Option<u8>,
    pub confidence: Option<u8>,
}
