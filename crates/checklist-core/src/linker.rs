//! Linking of usages to references through the `NameReferencesLinks` table.

use std::fmt;
use std::str::FromStr;

use checklist_ingest::SchemaReader;
use checklist_model::{AcefTerm, HasIssues, Issue, RawRecord};
use checklist_store::{StagedPayload, StagingStore};
use serde::Serialize;

use crate::error::Result;

/// Relation between a usage and a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceLinkType {
    /// Original publication of the name (`NomRef`).
    Nomenclatural,
    /// Taxonomic treatment backing the usage (`TaxAccRef`).
    TaxonBibliography,
    /// Source of a vernacular name (`ComNameRef`).
    CommonName,
}

impl ReferenceLinkType {
    pub fn code(&self) -> &'static str {
        match self {
            ReferenceLinkType::Nomenclatural => "NomRef",
            ReferenceLinkType::TaxonBibliography => "TaxAccRef",
            ReferenceLinkType::CommonName => "ComNameRef",
        }
    }
}

impl fmt::Display for ReferenceLinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReferenceLinkType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_', '-'], "");
        match normalized.as_str() {
            "nomref" | "nomenclatural" | "nomenclaturalreference" => {
                Ok(ReferenceLinkType::Nomenclatural)
            }
            "taxaccref" | "taxon" | "taxonomic" | "bibliography" => {
                Ok(ReferenceLinkType::TaxonBibliography)
            }
            "comnameref" | "commonname" | "vernacular" => Ok(ReferenceLinkType::CommonName),
            _ => Err(format!("Unknown reference type: {s}")),
        }
    }
}

/// Counters of one linker pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub rows: usize,
    pub published_in: usize,
    pub bibliography: usize,
    pub ignored: usize,
    pub unresolved: usize,
    pub invalid_type: usize,
}

/// Resolves every row of the link table against the staged usages and
/// references. Problems become issues on the usage or reference involved.
pub fn link_references(reader: &SchemaReader, store: &mut StagingStore) -> Result<LinkStats> {
    let mut stats = LinkStats::default();
    let mut stream = reader.stream(&AcefTerm::NameReferencesLinks.into())?;
    for record in stream.by_ref() {
        let record = record?;
        store.put_verbatim(&record)?;
        stats.rows += 1;
        link(store, &record, &mut stats)?;
    }
    tracing::info!(
        rows = stats.rows,
        published_in = stats.published_in,
        bibliography = stats.bibliography,
        unresolved = stats.unresolved,
        skipped_lines = stream.skipped(),
        "linked references"
    );
    Ok(stats)
}

fn link(store: &mut StagingStore, record: &RawRecord, stats: &mut LinkStats) -> Result<()> {
    let subject_id = record.get(AcefTerm::ID);
    let reference_id = record.get(AcefTerm::ReferenceID);
    let link_type = match record.get(AcefTerm::ReferenceType) {
        None => Some(ReferenceLinkType::TaxonBibliography),
        Some(raw) => raw.parse::<ReferenceLinkType>().ok(),
    };

    let node = match subject_id {
        Some(id) => store.node_by_id(id)?,
        None => None,
    };
    let usage = match node {
        Some(node) => store.read_usage(node, false)?,
        None => None,
    };
    let reference = match reference_id {
        Some(id) => store.reference_by_id(id)?,
        None => None,
    };

    let (node, mut usage, mut reference) = match (node, usage, reference) {
        (Some(node), Some(usage), Some(reference)) => (node, usage, reference),
        (node, usage, reference) => {
            stats.unresolved += 1;
            match (node.zip(usage), reference) {
                (Some((node, mut usage)), None) => {
                    usage.add_issue(Issue::ReferenceIdInvalid);
                    store.update(node, &StagedPayload::Usage(usage))?;
                }
                (None, Some(mut reference)) => {
                    reference.add_issue(Issue::TaxonIdInvalid);
                    store.update_reference(&reference)?;
                }
                _ => {
                    tracing::info!(
                        subject_id = ?subject_id,
                        reference_id = ?reference_id,
                        file = record.file(),
                        line = record.line(),
                        "neither usage nor reference of link exist"
                    );
                }
            }
            return Ok(());
        }
    };

    let Some(link_type) = link_type else {
        tracing::debug!(
            reference_type = ?record.get(AcefTerm::ReferenceType),
            line = record.line(),
            "unknown reference type"
        );
        stats.invalid_type += 1;
        usage.add_issue(Issue::ReftypeInvalid);
        reference.add_issue(Issue::ReftypeInvalid);
        store.update(node, &StagedPayload::Usage(usage))?;
        store.update_reference(&reference)?;
        return Ok(());
    };

    match link_type {
        ReferenceLinkType::Nomenclatural => {
            let name = &mut usage.name;
            if name.published_in_id.is_some() {
                name.add_issue(Issue::MultiplePublishedInReferences);
            }
            name.published_in_id.clone_from(&reference.id);
            name.published_in_page.clone_from(&reference.page);
            stats.published_in += 1;
        }
        ReferenceLinkType::TaxonBibliography => {
            usage.reference_ids.extend(reference.id);
            stats.bibliography += 1;
        }
        ReferenceLinkType::CommonName => {
            // Attached when the vernacular names are read.
            stats.ignored += 1;
            return Ok(());
        }
    }
    store.update(node, &StagedPayload::Usage(usage))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_link_types() {
        assert_eq!(
            "NomRef".parse::<ReferenceLinkType>(),
            Ok(ReferenceLinkType::Nomenclatural)
        );
        assert_eq!(
            "taxaccref".parse::<ReferenceLinkType>(),
            Ok(ReferenceLinkType::TaxonBibliography)
        );
        assert_eq!(
            " ComNameRef ".parse::<ReferenceLinkType>(),
            Ok(ReferenceLinkType::CommonName)
        );
        assert!("Bogus".parse::<ReferenceLinkType>().is_err());
    }

    #[test]
    fn test_code_round_trip() {
        for link_type in [
            ReferenceLinkType::Nomenclatural,
            ReferenceLinkType::TaxonBibliography,
            ReferenceLinkType::CommonName,
        ] {
            assert_eq!(link_type.code().parse::<ReferenceLinkType>(), Ok(link_type));
        }
    }
}
