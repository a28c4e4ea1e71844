//! Geographic distribution of a taxon.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::capability::VerbatimKey;
use crate::issue::IssueSet;

/// Standard used to encode a distribution area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gazetteer {
    /// TDWG World Geographical Scheme for Recording Plant Distributions.
    Tdwg,
    /// ISO 3166 country codes.
    Iso,
    /// FAO major fishing areas.
    Fao,
    Longhurst,
    /// Terrestrial ecoregions of the world.
    Teow,
    /// International Hydrographic Organization sea areas.
    Iho,
    /// Marine Regions geographic identifiers.
    Mrgid,
    /// Free text, no standard.
    Text,
}

impl Gazetteer {
    /// Prefix used when an area is written as `prefix:code`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Gazetteer::Tdwg => "tdwg",
            Gazetteer::Iso => "iso",
            Gazetteer::Fao => "fao",
            Gazetteer::Longhurst => "longhurst",
            Gazetteer::Teow => "teow",
            Gazetteer::Iho => "iho",
            Gazetteer::Mrgid => "mrgid",
            Gazetteer::Text => "text",
        }
    }
}

impl fmt::Display for Gazetteer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Gazetteer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-', '_'], "");
        match normalized.as_str() {
            "tdwg" | "wgsrpd" => Ok(Gazetteer::Tdwg),
            "iso" | "iso3166" | "iso31661" | "iso31662" => Ok(Gazetteer::Iso),
            "fao" | "faofishingareas" => Ok(Gazetteer::Fao),
            "longhurst" => Ok(Gazetteer::Longhurst),
            "teow" => Ok(Gazetteer::Teow),
            "iho" => Ok(Gazetteer::Iho),
            "mrgid" | "marineregions" => Ok(Gazetteer::Mrgid),
            "text" | "freetext" => Ok(Gazetteer::Text),
            _ => Err(format!("Unknown gazetteer: {s}")),
        }
    }
}

/// An area split into its standard and code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    pub gazetteer: Gazetteer,
    pub code: String,
}

impl Area {
    /// Parses `prefix:code`. Values without a known prefix are free text.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if let Some((prefix, code)) = value.split_once(':')
            && let Ok(gazetteer) = prefix.parse::<Gazetteer>()
            && !code.trim().is_empty()
        {
            return Self {
                gazetteer,
                code: code.trim().to_string(),
            };
        }
        Self {
            gazetteer: Gazetteer::Text,
            code: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionStatus {
    #[default]
    Native,
    Domesticated,
    Alien,
    Uncertain,
}

impl DistributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionStatus::Native => "native",
            DistributionStatus::Domesticated => "domesticated",
            DistributionStatus::Alien => "alien",
            DistributionStatus::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" | "indigenous" | "endemic" => Ok(DistributionStatus::Native),
            "domesticated" | "cultivated" | "managed" => Ok(DistributionStatus::Domesticated),
            "alien" | "introduced" | "naturalised" | "naturalized" | "invasive" => {
                Ok(DistributionStatus::Alien)
            }
            "uncertain" | "doubtful" | "questionable" => Ok(DistributionStatus::Uncertain),
            _ => Err(format!("Unknown distribution status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub area: String,
    pub gazetteer: Gazetteer,
    pub status: DistributionStatus,
    pub reference_id: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
    pub issues: IssueSet,
}
