//! Non-fatal data quality issues.
//!
//! Issues accumulate on raw records, names, usages and references while a
//! source is imported. They are never removed, only added, so that import
//! reports can show every problem found.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Accumulated issues of one record or object.
pub type IssueSet = BTreeSet<Issue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Issue {
    // === Record level ===
    NotInterpreted,
    PreviousLineSkipped,
    IdNotUnique,

    // === Identifiers and cross references ===
    TaxonIdInvalid,
    ParentIdInvalid,
    AcceptedIdInvalid,
    AcceptedNameMissing,
    ReferenceIdInvalid,
    ReftypeInvalid,
    MultiplePublishedInReferences,
    MultipleRelations,

    // === Names ===
    UnparsableName,
    UnparsableAuthorship,
    InconsistentName,
    UnmatchedNameBrackets,
    TruncatedName,
    DuplicateName,
    RankInvalid,

    // === Usages ===
    TaxonomicStatusInvalid,
    AccordingToDateInvalid,
    LifezoneInvalid,
    IsFossilInvalid,
    IsRecentInvalid,
    UrlInvalid,

    // === Distributions and vernacular names ===
    DistributionAreaInvalid,
    DistributionStatusInvalid,
    DistributionGazeteerInvalid,
    VernacularNameInvalid,
}

impl Issue {
    pub const ALL: &'static [Issue] = &[
        Issue::NotInterpreted,
        Issue::PreviousLineSkipped,
        Issue::IdNotUnique,
        Issue::TaxonIdInvalid,
        Issue::ParentIdInvalid,
        Issue::AcceptedIdInvalid,
        Issue::AcceptedNameMissing,
        Issue::ReferenceIdInvalid,
        Issue::ReftypeInvalid,
        Issue::MultiplePublishedInReferences,
        Issue::MultipleRelations,
        Issue::UnparsableName,
        Issue::UnparsableAuthorship,
        Issue::InconsistentName,
        Issue::UnmatchedNameBrackets,
        Issue::TruncatedName,
        Issue::DuplicateName,
        Issue::RankInvalid,
        Issue::TaxonomicStatusInvalid,
        Issue::AccordingToDateInvalid,
        Issue::LifezoneInvalid,
        Issue::IsFossilInvalid,
        Issue::IsRecentInvalid,
        Issue::UrlInvalid,
        Issue::DistributionAreaInvalid,
        Issue::DistributionStatusInvalid,
        Issue::DistributionGazeteerInvalid,
        Issue::VernacularNameInvalid,
    ];

    /// Returns the report code of this issue.
    pub fn as_str(&self) -> &'static str {
        match self {
            Issue::NotInterpreted => "NOT_INTERPRETED",
            Issue::PreviousLineSkipped => "PREVIOUS_LINE_SKIPPED",
            Issue::IdNotUnique => "ID_NOT_UNIQUE",
            Issue::TaxonIdInvalid => "TAXON_ID_INVALID",
            Issue::ParentIdInvalid => "PARENT_ID_INVALID",
            Issue::AcceptedIdInvalid => "ACCEPTED_ID_INVALID",
            Issue::AcceptedNameMissing => "ACCEPTED_NAME_MISSING",
            Issue::ReferenceIdInvalid => "REFERENCE_ID_INVALID",
            Issue::ReftypeInvalid => "REFTYPE_INVALID",
            Issue::MultiplePublishedInReferences => "MULTIPLE_PUBLISHED_IN_REFERENCES",
            Issue::MultipleRelations => "MULTIPLE_RELATIONS",
            Issue::UnparsableName => "UNPARSABLE_NAME",
            Issue::UnparsableAuthorship => "UNPARSABLE_AUTHORSHIP",
            Issue::InconsistentName => "INCONSISTENT_NAME",
            Issue::UnmatchedNameBrackets => "UNMATCHED_NAME_BRACKETS",
            Issue::TruncatedName => "TRUNCATED_NAME",
            Issue::DuplicateName => "DUPLICATE_NAME",
            Issue::RankInvalid => "RANK_INVALID",
            Issue::TaxonomicStatusInvalid => "TAXONOMIC_STATUS_INVALID",
            Issue::AccordingToDateInvalid => "ACCORDING_TO_DATE_INVALID",
            Issue::LifezoneInvalid => "LIFEZONE_INVALID",
            Issue::IsFossilInvalid => "IS_FOSSIL_INVALID",
            Issue::IsRecentInvalid => "IS_RECENT_INVALID",
            Issue::UrlInvalid => "URL_INVALID",
            Issue::DistributionAreaInvalid => "DISTRIBUTION_AREA_INVALID",
            Issue::DistributionStatusInvalid => "DISTRIBUTION_STATUS_INVALID",
            Issue::DistributionGazeteerInvalid => "DISTRIBUTION_GAZETEER_INVALID",
            Issue::VernacularNameInvalid => "VERNACULAR_NAME_INVALID",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Issue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Issue::ALL
            .iter()
            .find(|issue| issue.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown issue: {s}"))
    }
}
