//! Atomized scientific names and the name-building seam.
//!
//! Checklist sources deliver names already split into genus and epithets.
//! A [`NameParser`] assembles those atoms into a [`ParsedName`], parses the
//! authorship string and reports problems as issues on the name.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::capability::{HasIssues, VerbatimKey, impl_capabilities};
use crate::enums::{NomCode, Origin};
use crate::issue::{Issue, IssueSet};
use crate::rank::Rank;

static TEAM_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<team>.*?)[\s,]*(?P<year>\d{4}[a-z]?\??)?$").expect("valid team regex")
});

static AUTHOR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:&|,|\bet\b|\band\b)\s*").expect("valid separator regex"));

/// Authorship of a name, split into the combination and the basionym part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorship {
    pub combination: Vec<String>,
    pub year: Option<String>,
    pub basionym: Vec<String>,
    pub basionym_year: Option<String>,
}

impl Authorship {
    /// Parses `(Basionym Authors, 1850) Combination Authors, 1901`.
    ///
    /// Returns `None` when brackets do not pair up.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !brackets_balanced(raw) {
            return None;
        }
        let mut authorship = Authorship::default();
        let rest = if let Some(inner) = raw.strip_prefix('(') {
            let close = inner.find(')')?;
            let (team, year) = parse_team(&inner[..close]);
            authorship.basionym = team;
            authorship.basionym_year = year;
            &inner[close + 1..]
        } else {
            raw
        };
        if rest.contains('(') {
            return None;
        }
        let (team, year) = parse_team(rest);
        authorship.combination = team;
        authorship.year = year;
        Some(authorship)
    }

    pub fn is_empty(&self) -> bool {
        self.combination.is_empty()
            && self.year.is_none()
            && self.basionym.is_empty()
            && self.basionym_year.is_none()
    }
}

impl fmt::Display for Authorship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let basionym = render_team(&self.basionym, self.basionym_year.as_deref());
        let combination = render_team(&self.combination, self.year.as_deref());
        match (basionym.is_empty(), combination.is_empty()) {
            (true, _) => f.write_str(&combination),
            (false, true) => write!(f, "({basionym})"),
            (false, false) => write!(f, "({basionym}) {combination}"),
        }
    }
}

fn parse_team(part: &str) -> (Vec<String>, Option<String>) {
    let part = part.trim().trim_matches(',').trim();
    let Some(caps) = TEAM_YEAR.captures(part) else {
        return (vec![part.to_string()], None);
    };
    let year = caps.name("year").map(|m| m.as_str().to_string());
    let team = caps
        .name("team")
        .map(|m| {
            AUTHOR_SEPARATOR
                .split(m.as_str())
                .map(str::trim)
                .filter(|author| !author.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    (team, year)
}

fn render_team(team: &[String], year: Option<&str>) -> String {
    let mut out = match team {
        [] => String::new(),
        [single] => single.clone(),
        [init @ .., last] => format!("{} & {last}", init.join(", ")),
    };
    if let Some(year) = year {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(year);
    }
    out
}

/// Returns true when round and square brackets pair up.
pub fn brackets_balanced(value: &str) -> bool {
    let count = |c: char| value.chars().filter(|x| *x == c).count();
    count('(') == count(')') && count('[') == count(']')
}

/// An atomized scientific name with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    pub id: Option<String>,
    pub scientific_name: Option<String>,
    pub genus: Option<String>,
    pub infrageneric_epithet: Option<String>,
    pub specific_epithet: Option<String>,
    pub infraspecific_epithet: Option<String>,
    pub rank: Rank,
    pub code: Option<NomCode>,
    pub authorship: Authorship,
    /// Authorship exactly as given by the source.
    pub verbatim_authorship: Option<String>,
    pub published_in_id: Option<String>,
    pub published_in_page: Option<String>,
    pub origin: Origin,
    pub verbatim_key: Option<VerbatimKey>,
    pub issues: IssueSet,
}

impl_capabilities!(ParsedName);

impl ParsedName {
    /// A placeholder name holding only its id and rank, completed later
    /// once the parent's epithets are known.
    pub fn preliminary(id: Option<String>, rank: Rank) -> Self {
        Self {
            id,
            scientific_name: None,
            genus: None,
            infrageneric_epithet: None,
            specific_epithet: None,
            infraspecific_epithet: None,
            rank,
            code: None,
            authorship: Authorship::default(),
            verbatim_authorship: None,
            published_in_id: None,
            published_in_page: None,
            origin: Origin::Source,
            verbatim_key: None,
            issues: IssueSet::new(),
        }
    }

    /// True once a scientific name could be assembled.
    pub fn is_complete(&self) -> bool {
        self.scientific_name.is_some()
    }

    /// Genus and epithets without rank markers or authorship.
    pub fn canonical_name(&self) -> Option<String> {
        let genus = self.genus.as_deref()?;
        let mut parts = vec![genus];
        if self.specific_epithet.is_none() && self.rank == Rank::Subgenus {
            parts.extend(self.infrageneric_epithet.as_deref());
        }
        parts.extend(self.specific_epithet.as_deref());
        parts.extend(self.infraspecific_epithet.as_deref());
        Some(parts.join(" "))
    }

    /// Rebuilds the scientific name from the atoms.
    pub fn rebuild_scientific_name(&mut self) {
        self.scientific_name = self.render_scientific_name();
    }

    fn render_scientific_name(&self) -> Option<String> {
        let genus = self.genus.as_deref()?;
        let mut out = genus.to_string();
        match (
            self.infrageneric_epithet.as_deref(),
            self.specific_epithet.as_deref(),
        ) {
            (Some(sub), None) => {
                out.push_str(" subgen. ");
                out.push_str(sub);
            }
            (Some(sub), Some(_)) => {
                out.push_str(" (");
                out.push_str(sub);
                out.push(')');
            }
            _ => {}
        }
        if let Some(species) = self.specific_epithet.as_deref() {
            out.push(' ');
            out.push_str(species);
            if let Some(infra) = self.infraspecific_epithet.as_deref() {
                if let Some(marker) = self.infraspecific_marker() {
                    out.push(' ');
                    out.push_str(marker);
                }
                out.push(' ');
                out.push_str(infra);
            }
        }
        Some(out)
    }

    fn infraspecific_marker(&self) -> Option<&'static str> {
        match self.rank {
            Rank::InfraspecificName | Rank::Unranked => None,
            Rank::Subspecies if self.code == Some(NomCode::Zoological) => None,
            rank if rank.is_infraspecific() => rank.marker(),
            _ => None,
        }
    }

    /// Authorship rendered for display, if any.
    pub fn authorship_label(&self) -> Option<String> {
        (!self.authorship.is_empty()).then(|| self.authorship.to_string())
    }

    /// Scientific name followed by its authorship.
    pub fn label(&self) -> Option<String> {
        let name = self.scientific_name.as_deref()?;
        Some(match self.authorship_label() {
            Some(authorship) => format!("{name} {authorship}"),
            None => name.to_string(),
        })
    }
}

/// Name parts handed to a [`NameParser`].
#[derive(Debug, Clone, Default)]
pub struct NameAtoms<'a> {
    pub id: Option<&'a str>,
    pub genus: Option<&'a str>,
    pub infrageneric_epithet: Option<&'a str>,
    pub specific_epithet: Option<&'a str>,
    pub infraspecific_epithet: Option<&'a str>,
    pub rank: Option<Rank>,
    pub authorship: Option<&'a str>,
    pub code: Option<NomCode>,
}

/// Service assembling names from atoms.
///
/// Returns `None` when no usable name can be built at all.
pub trait NameParser: Send + Sync {
    fn build(&self, atoms: &NameAtoms<'_>) -> Option<ParsedName>;
}

/// Default [`NameParser`] for sources delivering atomized names.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomizedNameParser;

impl NameParser for AtomizedNameParser {
    fn build(&self, atoms: &NameAtoms<'_>) -> Option<ParsedName> {
        let genus = atoms.genus.map(str::trim).filter(|g| !g.is_empty())?;
        if genus.split_whitespace().count() > 1 {
            return None;
        }
        if atoms.infraspecific_epithet.is_some() && atoms.specific_epithet.is_none() {
            return None;
        }

        let rank = atoms.rank.unwrap_or(if atoms.infraspecific_epithet.is_some() {
            Rank::InfraspecificName
        } else if atoms.specific_epithet.is_some() {
            Rank::Species
        } else if atoms.infrageneric_epithet.is_some() {
            Rank::Subgenus
        } else {
            Rank::Genus
        });

        let mut name = ParsedName::preliminary(atoms.id.map(str::to_string), rank);
        name.code = atoms.code;
        name.genus = Some(genus.to_string());
        name.infrageneric_epithet = epithet(&mut name, atoms.infrageneric_epithet);
        name.specific_epithet = epithet(&mut name, atoms.specific_epithet);
        name.infraspecific_epithet = epithet(&mut name, atoms.infraspecific_epithet);

        if let Some(raw) = atoms.authorship.map(str::trim).filter(|a| !a.is_empty()) {
            name.verbatim_authorship = Some(raw.to_string());
            match Authorship::parse(raw) {
                Some(authorship) => name.authorship = authorship,
                None => name.add_issue(Issue::UnparsableAuthorship),
            }
        }
        name.rebuild_scientific_name();
        Some(name)
    }
}

/// Epithets are single lowercase words; anything else is kept but flagged.
fn epithet(name: &mut ParsedName, value: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    if value.split_whitespace().count() > 1 {
        name.add_issue(Issue::InconsistentName);
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_authorship_with_basionym() {
        let authorship = Authorship::parse("(L., 1753) Mill. & Sm., 1768").expect("parse");
        assert_eq!(authorship.basionym, vec!["L."]);
        assert_eq!(authorship.basionym_year.as_deref(), Some("1753"));
        assert_eq!(authorship.combination, vec!["Mill.", "Sm."]);
        assert_eq!(authorship.year.as_deref(), Some("1768"));
        assert_eq!(authorship.to_string(), "(L., 1753) Mill. & Sm., 1768");
    }

    #[test]
    fn test_parse_authorship_plain() {
        let authorship = Authorship::parse("Linnaeus").expect("parse");
        assert_eq!(authorship.combination, vec!["Linnaeus"]);
        assert!(authorship.year.is_none());
        assert!(authorship.basionym.is_empty());
    }

    #[test]
    fn test_parse_authorship_unmatched() {
        assert!(Authorship::parse("(L. Mill.").is_none());
        assert!(!brackets_balanced("Smith [1900"));
        assert!(brackets_balanced("(Smith) Jones"));
    }

    #[test]
    fn test_build_infraspecific_name() {
        let atoms = NameAtoms {
            id: Some("7"),
            genus: Some("Abies"),
            specific_epithet: Some("alba"),
            infraspecific_epithet: Some("alpina"),
            rank: Some(Rank::Variety),
            authorship: Some("Mill."),
            ..Default::default()
        };
        let name = AtomizedNameParser.build(&atoms).expect("name");
        assert_eq!(
            name.scientific_name.as_deref(),
            Some("Abies alba var. alpina")
        );
        assert_eq!(name.canonical_name().as_deref(), Some("Abies alba alpina"));
        assert_eq!(name.label().as_deref(), Some("Abies alba var. alpina Mill."));
        assert_eq!(name.id.as_deref(), Some("7"));
    }

    #[test]
    fn test_build_infers_rank() {
        let atoms = NameAtoms {
            genus: Some("Abies"),
            infrageneric_epithet: Some("Pseudopicea"),
            specific_epithet: Some("alba"),
            ..Default::default()
        };
        let name = AtomizedNameParser.build(&atoms).expect("name");
        assert_eq!(name.rank, Rank::Species);
        assert_eq!(
            name.scientific_name.as_deref(),
            Some("Abies (Pseudopicea) alba")
        );
    }

    #[test]
    fn test_zoological_subspecies_has_no_marker() {
        let atoms = NameAtoms {
            genus: Some("Puma"),
            specific_epithet: Some("concolor"),
            infraspecific_epithet: Some("couguar"),
            rank: Some(Rank::Subspecies),
            code: Some(NomCode::Zoological),
            ..Default::default()
        };
        let name = AtomizedNameParser.build(&atoms).expect("name");
        assert_eq!(
            name.scientific_name.as_deref(),
            Some("Puma concolor couguar")
        );
    }

    #[test]
    fn test_build_without_genus_fails() {
        let atoms = NameAtoms {
            specific_epithet: Some("alba"),
            ..Default::default()
        };
        assert!(AtomizedNameParser.build(&atoms).is_none());
    }

    #[test]
    fn test_unparsable_authorship_is_flagged() {
        let atoms = NameAtoms {
            genus: Some("Abies"),
            specific_epithet: Some("alba"),
            authorship: Some("(Mill."),
            ..Default::default()
        };
        let name = AtomizedNameParser.build(&atoms).expect("name");
        assert!(name.has_issue(Issue::UnparsableAuthorship));
        assert_eq!(name.verbatim_authorship.as_deref(), Some("(Mill."));
        assert!(name.authorship.is_empty());
    }

    #[test]
    fn test_preliminary_name_is_incomplete() {
        let name = ParsedName::preliminary(Some("x".into()), Rank::InfraspecificName);
        assert!(!name.is_complete());
        assert!(name.canonical_name().is_none());
    }
}
