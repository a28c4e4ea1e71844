//! Import statistics.

use std::collections::BTreeMap;

use checklist_model::{DatasetMetadata, Issue, Rank};
use checklist_store::{Label, NodeBatchProcessor, NodeId, Result, StagingStore};
use serde::Serialize;

use crate::linker::LinkStats;
use crate::resolver::ResolverStats;

/// Records read and objects staged for one row type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowTypeCount {
    pub records: usize,
    pub inserted: usize,
    /// Empty or short lines skipped by the reader.
    pub skipped_lines: usize,
}

/// Counters filled while inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsertCounts {
    /// Keyed by row type name.
    pub row_types: BTreeMap<String, RowTypeCount>,
    /// Rows whose `AcceptedTaxonID` matched no taxon, keyed by row type name.
    pub bad_taxon_fk: BTreeMap<String, usize>,
}

impl InsertCounts {
    pub fn row_type(&mut self, name: &str) -> &mut RowTypeCount {
        self.row_types.entry(name.to_string()).or_default()
    }

    pub fn bad_taxon_fk(&mut self, name: &str) {
        *self.bad_taxon_fk.entry(name.to_string()).or_default() += 1;
    }
}

/// Outcome of importing one source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub metadata: Option<DatasetMetadata>,
    pub counts: InsertCounts,
    pub resolver: ResolverStats,
    pub links: LinkStats,
    pub names: usize,
    pub taxa: usize,
    pub synonyms: usize,
    pub roots: usize,
    pub ranks: BTreeMap<Rank, usize>,
    pub references: usize,
    pub verbatim_records: usize,
    pub issues: BTreeMap<Issue, usize>,
    pub duration_ms: u64,
}

impl ImportSummary {
    /// Collects node, rank and issue counts from a completed store.
    pub fn collect(
        store: &mut StagingStore,
        counts: InsertCounts,
        resolver: ResolverStats,
        links: LinkStats,
    ) -> Result<Self> {
        let mut ranks = RankCounter::default();
        store.process(Some(Label::Name), usize::MAX, &mut ranks)?;
        Ok(Self {
            metadata: store.metadata()?,
            counts,
            resolver,
            links,
            names: store.node_count(Some(Label::Name)),
            taxa: store.node_count(Some(Label::Taxon)),
            synonyms: store.node_count(Some(Label::Synonym)),
            roots: store.node_count(Some(Label::Root)),
            ranks: ranks.ranks,
            references: store.reference_count()?,
            verbatim_records: store.verbatim_count()?,
            issues: store.issue_counts()?,
            duration_ms: 0,
        })
    }

    /// Total number of issues of all kinds.
    pub fn issue_total(&self) -> usize {
        self.issues.values().sum()
    }

    pub fn bad_taxon_fk_total(&self) -> usize {
        self.counts.bad_taxon_fk.values().sum()
    }
}

#[derive(Default)]
struct RankCounter {
    ranks: BTreeMap<Rank, usize>,
}

impl NodeBatchProcessor for RankCounter {
    fn process(&mut self, store: &mut StagingStore, node: NodeId) -> Result<()> {
        if let Some(rank) = store.props(node).and_then(|props| props.rank) {
            *self.ranks.entry(rank).or_default() += 1;
        }
        Ok(())
    }
}
