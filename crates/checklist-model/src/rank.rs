//! Taxonomic ranks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Taxonomic rank, ordered from the highest to the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Kingdom,
    Phylum,
    Class,
    Order,
    Superfamily,
    Family,
    Genus,
    Subgenus,
    Species,
    /// Infraspecific name of unknown rank.
    InfraspecificName,
    Subspecies,
    Variety,
    Subvariety,
    Form,
    Subform,
    Unranked,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Kingdom => "kingdom",
            Rank::Phylum => "phylum",
            Rank::Class => "class",
            Rank::Order => "order",
            Rank::Superfamily => "superfamily",
            Rank::Family => "family",
            Rank::Genus => "genus",
            Rank::Subgenus => "subgenus",
            Rank::Species => "species",
            Rank::InfraspecificName => "infraspecific name",
            Rank::Subspecies => "subspecies",
            Rank::Variety => "variety",
            Rank::Subvariety => "subvariety",
            Rank::Form => "form",
            Rank::Subform => "subform",
            Rank::Unranked => "unranked",
        }
    }

    /// Abbreviated marker placed between the epithets of a scientific name.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Rank::Subgenus => Some("subgen."),
            Rank::Species => Some("sp."),
            Rank::InfraspecificName => Some("infrasp."),
            Rank::Subspecies => Some("subsp."),
            Rank::Variety => Some("var."),
            Rank::Subvariety => Some("subvar."),
            Rank::Form => Some("f."),
            Rank::Subform => Some("subf."),
            _ => None,
        }
    }

    /// Returns true for ranks below species.
    pub fn is_infraspecific(&self) -> bool {
        matches!(
            self,
            Rank::InfraspecificName
                | Rank::Subspecies
                | Rank::Variety
                | Rank::Subvariety
                | Rank::Form
                | Rank::Subform
        )
    }

    pub fn is_species_or_below(&self) -> bool {
        *self == Rank::Species || self.is_infraspecific()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = String;

    /// Parses full rank names as well as the common name markers
    /// (`subsp.`, `ssp`, `var.`, `f.`, `forma`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches('.').to_lowercase();
        match normalized.as_str() {
            "kingdom" | "regnum" => Ok(Rank::Kingdom),
            "phylum" | "division" => Ok(Rank::Phylum),
            "class" | "classis" => Ok(Rank::Class),
            "order" | "ordo" => Ok(Rank::Order),
            "superfamily" | "superfam" => Ok(Rank::Superfamily),
            "family" | "fam" => Ok(Rank::Family),
            "genus" | "gen" => Ok(Rank::Genus),
            "subgenus" | "subgen" => Ok(Rank::Subgenus),
            "species" | "sp" | "spec" => Ok(Rank::Species),
            "infraspecific name" | "infrasp" | "infraspecies" => Ok(Rank::InfraspecificName),
            "subspecies" | "subsp" | "ssp" => Ok(Rank::Subspecies),
            "variety" | "var" | "varietas" => Ok(Rank::Variety),
            "subvariety" | "subvar" => Ok(Rank::Subvariety),
            "form" | "forma" | "f" | "fo" => Ok(Rank::Form),
            "subform" | "subforma" | "subf" => Ok(Rank::Subform),
            "unranked" => Ok(Rank::Unranked),
            _ => Err(format!("Unknown rank: {s}")),
        }
    }
}
