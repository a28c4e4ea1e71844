//! Small controlled enumerations shared by names and usages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Nomenclatural code governing a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NomCode {
    Bacterial,
    Botanical,
    Cultivars,
    Virus,
    Zoological,
}

impl NomCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NomCode::Bacterial => "bacterial",
            NomCode::Botanical => "botanical",
            NomCode::Cultivars => "cultivars",
            NomCode::Virus => "virus",
            NomCode::Zoological => "zoological",
        }
    }
}

impl fmt::Display for NomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NomCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BACTERIAL" | "ICNB" | "ICNP" => Ok(NomCode::Bacterial),
            "BOTANICAL" | "ICN" | "ICBN" => Ok(NomCode::Botanical),
            "CULTIVARS" | "ICNCP" => Ok(NomCode::Cultivars),
            "VIRUS" | "ICTV" | "ICVCN" => Ok(NomCode::Virus),
            "ZOOLOGICAL" | "ICZN" => Ok(NomCode::Zoological),
            _ => Err(format!("Unknown nomenclatural code: {s}")),
        }
    }
}

/// How a name came into existence during the import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Interpreted directly from a source record.
    #[default]
    Source,
    /// Completed with epithets taken from the declared parent record.
    VerbatimParent,
}

/// Nomenclatural relation between two names, as loaded into the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NomRelType {
    Basionym,
    SpellingCorrection,
    BasedOn,
    ReplacementName,
    Conserved,
    LaterHomonym,
    Superfluous,
}

impl NomRelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NomRelType::Basionym => "basionym",
            NomRelType::SpellingCorrection => "spelling correction",
            NomRelType::BasedOn => "based on",
            NomRelType::ReplacementName => "replacement name",
            NomRelType::Conserved => "conserved",
            NomRelType::LaterHomonym => "later homonym",
            NomRelType::Superfluous => "superfluous",
        }
    }
}

impl fmt::Display for NomRelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Habitat zone of a taxon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lifezone {
    Brackish,
    Freshwater,
    Marine,
    Terrestrial,
}

impl Lifezone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifezone::Brackish => "brackish",
            Lifezone::Freshwater => "freshwater",
            Lifezone::Marine => "marine",
            Lifezone::Terrestrial => "terrestrial",
        }
    }
}

impl fmt::Display for Lifezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brackish" | "brackish water" => Ok(Lifezone::Brackish),
            "freshwater" | "fresh water" | "limnic" => Ok(Lifezone::Freshwater),
            "marine" | "saltwater" => Ok(Lifezone::Marine),
            "terrestrial" | "land" => Ok(Lifezone::Terrestrial),
            _ => Err(format!("Unknown lifezone: {s}")),
        }
    }
}
