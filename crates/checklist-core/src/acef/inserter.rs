//! Two-phase insertion of an ACEF source into the staging store.
//!
//! Phase one stages references and usages table by table. Phase two runs
//! in a single store transaction and adds everything that depends on
//! staged usages: resolved relations, distributions, vernacular names and
//! reference links.

use std::time::Instant;

use checklist_ingest::SchemaReader;
use checklist_model::{
    AcefTerm, HasIssues, HasVerbatimProvenance, Issue, NameUsage, RawRecord, Term,
    TaxonomicStatus, VerbatimKey,
};
use checklist_store::{Label, NodeId, StagedPayload, StagingStore};
use tracing::info_span;

use crate::acef::interpreter::AcefInterpreter;
use crate::error::{NormalizationError, Phase, Result};
use crate::linker::{LinkStats, link_references};
use crate::options::ImportOptions;
use crate::resolver::{RelationResolver, ResolverStats};
use crate::summary::InsertCounts;

/// Drives both insertion phases for one source.
pub struct AcefInserter<'a> {
    reader: &'a SchemaReader,
    store: &'a mut StagingStore,
    interpreter: AcefInterpreter,
    batch_size: usize,
    completed: Option<Phase>,
    counts: InsertCounts,
    resolver: ResolverStats,
    links: LinkStats,
}

impl<'a> AcefInserter<'a> {
    pub fn new(
        reader: &'a SchemaReader,
        store: &'a mut StagingStore,
        options: &ImportOptions,
    ) -> Self {
        Self {
            reader,
            store,
            interpreter: AcefInterpreter::default().with_code(options.code),
            batch_size: options.batch_size,
            completed: None,
            counts: InsertCounts::default(),
            resolver: ResolverStats::default(),
            links: LinkStats::default(),
        }
    }

    /// Replace the interpreter, e.g. to plug in other name or reference services.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: AcefInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn counts(&self) -> &InsertCounts {
        &self.counts
    }

    pub fn resolver_stats(&self) -> ResolverStats {
        self.resolver
    }

    pub fn link_stats(&self) -> LinkStats {
        self.links
    }

    /// Consumes the inserter and returns its counters.
    pub fn into_stats(self) -> (InsertCounts, ResolverStats, LinkStats) {
        (self.counts, self.resolver, self.links)
    }

    // === Phase 1 ===

    /// Stages metadata, references, accepted species, accepted
    /// infraspecies and synonyms in that order.
    ///
    /// # Errors
    ///
    /// [`NormalizationError::PhaseOrder`] if called twice, otherwise any
    /// read or store failure wrapped in
    /// [`NormalizationError::NormalizationFailed`].
    pub fn batch_insert(&mut self) -> Result<()> {
        if self.completed.is_some() {
            return Err(NormalizationError::PhaseOrder {
                phase: Phase::BatchInsert,
            });
        }
        let start = Instant::now();
        let span = info_span!("batch_insert");
        span.in_scope(|| self.run_batch_insert())
            .map_err(|e| NormalizationError::failed(Phase::BatchInsert, e))?;
        self.completed = Some(Phase::BatchInsert);
        tracing::info!(
            nodes = self.store.node_count(None),
            duration_ms = start.elapsed().as_millis(),
            "batch insert complete"
        );
        Ok(())
    }

    fn run_batch_insert(&mut self) -> Result<()> {
        let reader = self.reader;
        let interpreter = &self.interpreter;
        let store = &mut *self.store;
        let counts = &mut self.counts;

        insert_metadata(reader, store, interpreter)?;

        insert_records(reader, store, counts, AcefTerm::Reference, |store, record, key| {
            let Some(mut reference) = interpreter.interpret_reference(record) else {
                return Ok(false);
            };
            reference.set_verbatim_key(key);
            store.put_reference(&reference)?;
            Ok(true)
        })?;

        insert_records(reader, store, counts, AcefTerm::AcceptedSpecies, |store, record, key| {
            match interpreter.interpret_species(record) {
                Some(usage) => insert_taxon(store, record, usage, key),
                None => Ok(false),
            }
        })?;

        insert_records(
            reader,
            store,
            counts,
            AcefTerm::AcceptedInfraSpecificTaxa,
            |store, record, key| match interpreter.interpret_infraspecies(record) {
                Some(usage) => insert_taxon(store, record, usage, key),
                None => Ok(false),
            },
        )?;

        insert_records(reader, store, counts, AcefTerm::Synonyms, |store, record, key| {
            match interpreter.interpret_synonym(record) {
                Some(usage) => insert_synonym(store, record, usage, key),
                None => Ok(false),
            }
        })?;
        Ok(())
    }

    // === Phase 2 ===

    /// Resolves relations, then adds distributions, vernacular names and
    /// reference links, all inside one store transaction.
    ///
    /// # Errors
    ///
    /// [`NormalizationError::PhaseOrder`] unless [`Self::batch_insert`]
    /// completed before. Other failures roll the transaction back and are
    /// wrapped in [`NormalizationError::NormalizationFailed`].
    pub fn post_batch_insert(&mut self) -> Result<()> {
        if self.completed != Some(Phase::BatchInsert) {
            return Err(NormalizationError::PhaseOrder {
                phase: Phase::PostBatchInsert,
            });
        }
        let start = Instant::now();
        let span = info_span!("post_batch_insert", batch_size = self.batch_size);
        let reader = self.reader;
        let interpreter = &self.interpreter;
        let batch_size = self.batch_size;
        let store = &mut *self.store;
        let counts = &mut self.counts;
        let (resolver, links) = span
            .in_scope(|| {
                store.in_transaction(|store| -> Result<_> {
                    let mut resolver = RelationResolver::new(interpreter);
                    let processed = store.process_all(batch_size, &mut resolver)?;
                    tracing::info!(processed, "resolved relations");

                    insert_distributions(reader, store, interpreter, counts)?;
                    insert_vernaculars(reader, store, interpreter, counts)?;
                    let links = link_references(reader, store)?;
                    Ok((resolver.stats(), links))
                })
            })
            .map_err(|e| NormalizationError::failed(Phase::PostBatchInsert, e))?;

        self.resolver = resolver;
        self.links = links;
        self.completed = Some(Phase::PostBatchInsert);
        tracing::info!(
            completed_names = resolver.completed_names,
            removed = resolver.removed,
            duration_ms = start.elapsed().as_millis(),
            "post batch insert complete"
        );
        Ok(())
    }
}

// === Record Loop ===

/// Issues that already explain why a record was not inserted.
const SKIP_REASONS: [Issue; 3] = [Issue::IdNotUnique, Issue::DuplicateName, Issue::TaxonIdInvalid];

/// Streams one row type, storing every record verbatim before handing it
/// to `handle`. Issues added by the handler are written back to the
/// verbatim record. A handler returning false marks the record as not
/// interpreted unless it already explains why it was skipped.
fn insert_records<F>(
    reader: &SchemaReader,
    store: &mut StagingStore,
    counts: &mut InsertCounts,
    row_type: AcefTerm,
    mut handle: F,
) -> Result<usize>
where
    F: FnMut(&mut StagingStore, &mut RawRecord, VerbatimKey) -> Result<bool>,
{
    let term = Term::from(row_type);
    if !reader.has_schema(&term) {
        tracing::debug!(row_type = %term, "no data file");
        return Ok(0);
    }
    let start = Instant::now();
    let mut stream = reader.stream(&term)?;
    let mut records = 0usize;
    let mut inserted = 0usize;
    for record in stream.by_ref() {
        let mut record = record?;
        records += 1;
        let key = store.put_verbatim(&record)?;
        let before = record.issues().clone();
        if handle(store, &mut record, key)? {
            inserted += 1;
        } else if !SKIP_REASONS.iter().any(|issue| record.has_issue(*issue)) {
            record.add_issue(Issue::NotInterpreted);
        }
        if *record.issues() != before {
            store.update_verbatim(key, &record)?;
        }
    }

    let count = counts.row_type(row_type.as_str());
    count.records += records;
    count.inserted += inserted;
    count.skipped_lines += stream.skipped();
    tracing::info!(
        row_type = %term,
        records,
        inserted,
        skipped_lines = stream.skipped(),
        duration_ms = start.elapsed().as_millis(),
        "inserted records"
    );
    Ok(inserted)
}

fn insert_metadata(
    reader: &SchemaReader,
    store: &mut StagingStore,
    interpreter: &AcefInterpreter,
) -> Result<()> {
    let term = Term::from(AcefTerm::SourceDatabase);
    if !reader.has_schema(&term) {
        return Ok(());
    }
    if let Some(record) = reader.stream(&term)?.next() {
        let metadata = interpreter.interpret_metadata(&record?);
        tracing::info!(title = ?metadata.title, version = ?metadata.version, "read source metadata");
        store.put_metadata(&metadata)?;
    }
    Ok(())
}

// === Usages ===

fn stamp(usage: &mut NameUsage, key: VerbatimKey) {
    usage.set_verbatim_key(key);
    usage.name.set_verbatim_key(key);
}

fn insert_taxon(
    store: &mut StagingStore,
    record: &mut RawRecord,
    mut usage: NameUsage,
    key: VerbatimKey,
) -> Result<bool> {
    if let Some(id) = &usage.id
        && store.node_by_id(id)?.is_some()
    {
        tracing::info!(id = %id, file = record.file(), line = record.line(), "duplicate taxon id");
        record.add_issue(Issue::IdNotUnique);
        return Ok(false);
    }
    stamp(&mut usage, key);
    let node = store.create_node(&[Label::Name, Label::Taxon]);
    store.put(node, &StagedPayload::Usage(usage))?;
    Ok(true)
}

/// Stages a synonym. A synonym id seen before with another accepted id
/// becomes a pro parte synonym of both instead of a second node.
fn insert_synonym(
    store: &mut StagingStore,
    record: &mut RawRecord,
    mut usage: NameUsage,
    key: VerbatimKey,
) -> Result<bool> {
    let existing = match &usage.id {
        Some(id) => store.node_by_id(id)?,
        None => None,
    };
    let Some(existing) = existing else {
        stamp(&mut usage, key);
        let node = store.create_node(&[Label::Name, Label::Synonym]);
        store.put(node, &StagedPayload::Usage(usage))?;
        return Ok(true);
    };
    add_pro_parte(store, record, existing, &usage)
}

fn add_pro_parte(
    store: &mut StagingStore,
    record: &mut RawRecord,
    existing: NodeId,
    usage: &NameUsage,
) -> Result<bool> {
    let Some(mut staged) = store.read_usage(existing, false)? else {
        record.add_issue(Issue::IdNotUnique);
        return Ok(false);
    };
    let accepted = usage
        .as_synonym()
        .and_then(|synonym| synonym.accepted_ids.first().cloned());
    let Some(synonym) = staged.as_synonym_mut() else {
        tracing::info!(
            id = ?usage.id,
            line = record.line(),
            "synonym id already used by a taxon"
        );
        record.add_issue(Issue::IdNotUnique);
        return Ok(false);
    };
    match accepted {
        Some(accepted) if !synonym.accepted_ids.contains(&accepted) => {
            tracing::debug!(id = ?usage.id, accepted = %accepted, "pro parte synonym");
            synonym.accepted_ids.push(accepted);
            staged.set_status(TaxonomicStatus::ProparteSynonym);
            store.update(existing, &StagedPayload::Usage(staged))?;
            Ok(true)
        }
        _ => {
            record.add_issue(Issue::DuplicateName);
            record.add_issue(Issue::TaxonIdInvalid);
            Ok(false)
        }
    }
}

// === Taxon Dependent Records ===

/// Looks up the accepted taxon a distribution or vernacular row belongs to.
fn taxon_for(
    store: &StagingStore,
    record: &mut RawRecord,
    counts: &mut InsertCounts,
    row_type: AcefTerm,
) -> Result<Option<(NodeId, NameUsage)>> {
    let taxon = match record.get(AcefTerm::AcceptedTaxonID) {
        Some(id) => match store.node_by_id(id)? {
            Some(node) => store
                .read_usage(node, false)?
                .filter(|usage| !usage.is_synonym())
                .map(|usage| (node, usage)),
            None => None,
        },
        None => None,
    };
    if taxon.is_none() {
        tracing::warn!(
            row_type = row_type.as_str(),
            taxon_id = ?record.get(AcefTerm::AcceptedTaxonID),
            line = record.line(),
            "row refers to a missing taxon"
        );
        counts.bad_taxon_fk(row_type.as_str());
        record.add_issue(Issue::TaxonIdInvalid);
    }
    Ok(taxon)
}

fn insert_distributions(
    reader: &SchemaReader,
    store: &mut StagingStore,
    interpreter: &AcefInterpreter,
    counts: &mut InsertCounts,
) -> Result<usize> {
    let mut bad = InsertCounts::default();
    let inserted = insert_records(reader, store, counts, AcefTerm::Distribution, |store, record, key| {
        let Some((node, mut usage)) = taxon_for(store, record, &mut bad, AcefTerm::Distribution)?
        else {
            return Ok(false);
        };
        let distributions = interpreter.interpret_distributions(record, &*store, key);
        if distributions.is_empty() {
            return Ok(false);
        }
        if let Some(taxon) = usage.as_taxon_mut() {
            taxon.distributions.extend(distributions);
        }
        store.update(node, &StagedPayload::Usage(usage))?;
        Ok(true)
    })?;
    counts.bad_taxon_fk.extend(bad.bad_taxon_fk);
    Ok(inserted)
}

fn insert_vernaculars(
    reader: &SchemaReader,
    store: &mut StagingStore,
    interpreter: &AcefInterpreter,
    counts: &mut InsertCounts,
) -> Result<usize> {
    let mut bad = InsertCounts::default();
    let inserted = insert_records(reader, store, counts, AcefTerm::CommonNames, |store, record, key| {
        let Some((node, mut usage)) = taxon_for(store, record, &mut bad, AcefTerm::CommonNames)?
        else {
            return Ok(false);
        };
        let Some(vernacular) = interpreter.interpret_vernacular(record, &*store, key) else {
            return Ok(false);
        };
        if let Some(taxon) = usage.as_taxon_mut() {
            taxon.vernacular_names.push(vernacular);
        }
        store.update(node, &StagedPayload::Usage(usage))?;
        Ok(true)
    })?;
    counts.bad_taxon_fk.extend(bad.bad_taxon_fk);
    Ok(inserted)
}
