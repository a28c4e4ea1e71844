//! Taxonomic status of a name usage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxonomicStatus {
    Accepted,
    ProvisionallyAccepted,
    Doubtful,
    Synonym,
    HomotypicSynonym,
    HeterotypicSynonym,
    ProparteSynonym,
    AmbiguousSynonym,
    Misapplied,
}

impl TaxonomicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomicStatus::Accepted => "accepted",
            TaxonomicStatus::ProvisionallyAccepted => "provisionally accepted",
            TaxonomicStatus::Doubtful => "doubtful",
            TaxonomicStatus::Synonym => "synonym",
            TaxonomicStatus::HomotypicSynonym => "homotypic synonym",
            TaxonomicStatus::HeterotypicSynonym => "heterotypic synonym",
            TaxonomicStatus::ProparteSynonym => "pro parte synonym",
            TaxonomicStatus::AmbiguousSynonym => "ambiguous synonym",
            TaxonomicStatus::Misapplied => "misapplied",
        }
    }

    /// Returns true for every synonym kind, misapplied names included.
    pub fn is_synonym(&self) -> bool {
        !matches!(
            self,
            TaxonomicStatus::Accepted
                | TaxonomicStatus::ProvisionallyAccepted
                | TaxonomicStatus::Doubtful
        )
    }
}

impl fmt::Display for TaxonomicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomicStatus {
    type Err = String;

    /// Parses the status vocabulary used by checklist sources, including
    /// the ACEF `Sp2000NameStatus` values ("accepted name", "misapplied name").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        match normalized.as_str() {
            "accepted" | "accepted name" | "valid" | "valid name" => Ok(TaxonomicStatus::Accepted),
            "provisionally accepted" | "provisionally accepted name" => {
                Ok(TaxonomicStatus::ProvisionallyAccepted)
            }
            "doubtful" | "doubtful name" => Ok(TaxonomicStatus::Doubtful),
            "synonym" | "synonym name" => Ok(TaxonomicStatus::Synonym),
            "homotypic synonym" | "objective synonym" | "nomenclatural synonym" => {
                Ok(TaxonomicStatus::HomotypicSynonym)
            }
            "heterotypic synonym" | "subjective synonym" | "taxonomic synonym" => {
                Ok(TaxonomicStatus::HeterotypicSynonym)
            }
            "pro parte synonym" | "proparte synonym" => Ok(TaxonomicStatus::ProparteSynonym),
            "ambiguous synonym" => Ok(TaxonomicStatus::AmbiguousSynonym),
            "misapplied" | "misapplied name" => Ok(TaxonomicStatus::Misapplied),
            _ => Err(format!("Unknown taxonomic status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_acef_codes() {
        assert_eq!(
            "accepted name".parse::<TaxonomicStatus>(),
            Ok(TaxonomicStatus::Accepted)
        );
        assert_eq!(
            "Provisionally Accepted Name".parse::<TaxonomicStatus>(),
            Ok(TaxonomicStatus::ProvisionallyAccepted)
        );
        assert_eq!(
            "ambiguous_synonym".parse::<TaxonomicStatus>(),
            Ok(TaxonomicStatus::AmbiguousSynonym)
        );
        assert_eq!(
            "misapplied name".parse::<TaxonomicStatus>(),
            Ok(TaxonomicStatus::Misapplied)
        );
        assert!("whatever".parse::<TaxonomicStatus>().is_err());
    }

    #[test]
    fn test_is_synonym() {
        assert!(TaxonomicStatus::Misapplied.is_synonym());
        assert!(TaxonomicStatus::Synonym.is_synonym());
        assert!(!TaxonomicStatus::Doubtful.is_synonym());
        assert!(!TaxonomicStatus::ProvisionallyAccepted.is_synonym());
    }
}
