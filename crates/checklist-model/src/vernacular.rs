use serde::{Deserialize, Serialize};

use crate::capability::VerbatimKey;
use crate::issue::IssueSet;

/// A common name of a taxon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VernacularName {
    pub name: String,
    pub transliteration: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub area: Option<String>,
    pub reference_id: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
    pub issues: IssueSet,
}
