//! Bibliographic references and the reference-construction seam.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::capability::{VerbatimKey, impl_capabilities};
use crate::issue::IssueSet;

static PAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bpp?\.|:)\s*(?P<page>\d+(?:\s*[-–]\s*\d+)?)\s*\.?\s*$")
        .expect("valid page regex")
});

/// A citation keyed by its per-dataset id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: Option<String>,
    pub citation: Option<String>,
    pub authors: Option<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub source: Option<String>,
    pub page: Option<String>,
    pub verbatim_key: Option<VerbatimKey>,
    pub issues: IssueSet,
}

impl_capabilities!(Reference);

/// Citation parts as delivered by a source.
#[derive(Debug, Clone, Default)]
pub struct ReferenceParts<'a> {
    pub id: Option<&'a str>,
    pub authors: Option<&'a str>,
    pub year: Option<&'a str>,
    pub title: Option<&'a str>,
    pub details: Option<&'a str>,
}

/// Builds references from citation parts.
///
/// Returns `None` when the parts carry no citation content at all.
pub trait ReferenceFactory: Send + Sync {
    fn build(&self, parts: &ReferenceParts<'_>) -> Option<Reference>;
}

/// Default factory rendering `Authors (Year). Title. Details.`
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationBuilder;

impl ReferenceFactory for CitationBuilder {
    fn build(&self, parts: &ReferenceParts<'_>) -> Option<Reference> {
        let clean = |value: Option<&str>| {
            value
                .map(|v| v.trim().trim_end_matches('.').trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let authors = clean(parts.authors);
        let year = clean(parts.year);
        let title = clean(parts.title);
        let source = clean(parts.details);
        if authors.is_none() && year.is_none() && title.is_none() && source.is_none() {
            return None;
        }

        let mut citation = String::new();
        if let Some(authors) = &authors {
            citation.push_str(authors);
        }
        if let Some(year) = &year {
            if !citation.is_empty() {
                citation.push(' ');
            }
            citation.push_str(&format!("({year})"));
        }
        for part in [&title, &source].into_iter().flatten() {
            if !citation.is_empty() {
                citation.push_str(". ");
            }
            citation.push_str(part);
        }
        citation.push('.');

        let page = source.as_deref().and_then(extract_page);
        Some(Reference {
            id: parts.id.map(str::to_string),
            citation: Some(citation),
            authors,
            year,
            title,
            source,
            page,
            verbatim_key: None,
            issues: IssueSet::new(),
        })
    }
}

/// Extracts a trailing page or page range (`p. 12`, `pp. 12-14`, `: 345`).
pub fn extract_page(details: &str) -> Option<String> {
    PAGE.captures(details)
        .and_then(|caps| caps.name("page"))
        .map(|m| m.as_str().split_whitespace().collect::<String>())
}

/// Read access to references that are already staged.
pub trait ReferenceLookup {
    fn reference_exists(&self, id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_citation() {
        let parts = ReferenceParts {
            id: Some("r1"),
            authors: Some("Smith, J."),
            year: Some("1901"),
            title: Some("On firs"),
            details: Some("J. Bot. 12: 34-36"),
        };
        let reference = CitationBuilder.build(&parts).expect("reference");
        assert_eq!(
            reference.citation.as_deref(),
            Some("Smith, J (1901). On firs. J. Bot. 12: 34-36.")
        );
        assert_eq!(reference.page.as_deref(), Some("34-36"));
        assert_eq!(reference.id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_empty_parts_build_nothing() {
        let parts = ReferenceParts {
            id: Some("r1"),
            ..Default::default()
        };
        assert!(CitationBuilder.build(&parts).is_none());
    }

    #[test]
    fn test_extract_page() {
        assert_eq!(extract_page("Fl. Eur. p. 12").as_deref(), Some("12"));
        assert_eq!(extract_page("Fl. Eur. pp. 12 - 14.").as_deref(), Some("12-14"));
        assert_eq!(extract_page("Some journal"), None);
    }
}
