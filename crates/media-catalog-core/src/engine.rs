//! The reconciliation engine: merges the sorted candidate stream against
//! the sorted catalog cursor, deciding per name whether a candidate is
//! new, unchanged, moved, duplicated on another host, or an unrelated
//! collision that needs a deterministic rename.
//!
//! Strictly sequential by design: the merge depends on total order across
//! both streams and mutates shared transaction state.

use crate::config::EngineConfig;
use crate::error::Error;
use crate::model::{CatalogRecord, MediaCandidate};
use crate::progress::ProgressReporter;
use crate::storage::{CatalogStore, InsertOutcome, PageKey};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Running totals for one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileCounters {
    pub inserted: usize,
    pub updated: usize,
    /// Candidate already cataloged with this host's path.
    pub exists_here: usize,
    /// Record known only on other hosts; informational, never destructive.
    pub exists_elsewhere: usize,
}

impl ReconcileCounters {
    fn mutations(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Forward-only, ordered read over the catalog in bounded pages. Terminal
/// state is sticky: once a short page is seen, `next` keeps returning
/// `None` without further queries.
pub struct CatalogCursor {
    page: VecDeque<CatalogRecord>,
    last_key: Option<PageKey>,
    page_size: i64,
    exhausted: bool,
}

impl CatalogCursor {
    pub fn new(page_size: i64) -> CatalogCursor {
        CatalogCursor {
            page: VecDeque::new(),
            last_key: None,
            page_size,
            exhausted: false,
        }
    }

    pub fn next<S: CatalogStore>(&mut self, store: &mut S) -> Result<Option<CatalogRecord>, Error> {
        if self.page.is_empty() && !self.exhausted {
            let page = store.fetch_page(self.last_key.as_ref(), self.page_size)?;
            if (page.len() as i64) < self.page_size {
                self.exhausted = true;
            }
            if let Some(last) = page.last() {
                self.last_key = Some(PageKey::of(last));
            }
            self.page.extend(page);
        }
        Ok(self.page.pop_front())
    }
}

/// Outcome of a primary fill attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum PrimaryFillOutcome {
    Filled(usize),
    /// The catalog already has rows; nothing was written. Expected and
    /// recoverable, not an error.
    CatalogNotEmpty,
}

/// Load an empty catalog with the full candidate set, in batches. Refuses
/// to touch a catalog that already has rows.
pub fn primary_fill<S: CatalogStore>(
    store: &mut S,
    candidates: &[MediaCandidate],
    settings: &EngineConfig,
) -> Result<PrimaryFillOutcome, Error> {
    if store.has_records()? {
        warn!("Catalog is not empty; primary fill takes no action");
        return Ok(PrimaryFillOutcome::CatalogNotEmpty);
    }
    store.begin()?;
    let mut inserted = 0;
    let mut threshold = settings.commit_chunk;
    for chunk in candidates.chunks(settings.insert_batch) {
        inserted += store.insert_batch(chunk)?;
        if inserted > threshold {
            store.checkpoint()?;
            threshold += settings.commit_chunk;
        }
    }
    store.finish()?;
    info!("Primary fill inserted {} records", inserted);
    Ok(PrimaryFillOutcome::Filled(inserted))
}

/// Merges one run's candidates into the catalog. See module docs.
pub struct ReconcileEngine<S: CatalogStore> {
    store: S,
    settings: EngineConfig,
    host: String,
}

impl<S: CatalogStore> ReconcileEngine<S> {
    pub fn new(store: S, host: String, settings: EngineConfig) -> Self {
        ReconcileEngine {
            store,
            settings,
            host,
        }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Run the merge. `candidates` must be sorted ascending by
    /// (normalized key, name); the collector and the export reader both
    /// guarantee that.
    pub fn run(
        &mut self,
        candidates: Vec<MediaCandidate>,
        reporter: &dyn ProgressReporter,
    ) -> Result<ReconcileCounters, Error> {
        let mut counters = ReconcileCounters::default();
        if candidates.is_empty() {
            return Ok(counters);
        }

        self.store.begin()?;
        let mut cursor = CatalogCursor::new(self.settings.page_size);
        let mut candidates = candidates.into_iter();
        let mut candidate = candidates.next();
        let mut record = cursor.next(&mut self.store)?;
        let mut threshold = self.settings.commit_chunk;

        while let Some(c) = candidate.take() {
            let Some(r) = record.take() else {
                candidate = Some(c);
                break;
            };
            match c.normalized_key().cmp(r.normalized_key()) {
                Ordering::Equal => {
                    self.reconcile_same_name(c, &r, &mut counters)?;
                    candidate = candidates.next();
                    record = cursor.next(&mut self.store)?;
                }
                Ordering::Greater => {
                    // Catalog entry with no candidate this run. It may
                    // simply live on another host; nothing destructive.
                    if !r.paths.contains_key(&self.host) {
                        counters.exists_elsewhere += 1;
                    }
                    candidate = Some(c);
                    record = cursor.next(&mut self.store)?;
                }
                Ordering::Less => {
                    self.insert_new(&c, &mut counters)?;
                    candidate = candidates.next();
                    record = Some(r);
                }
            }

            if counters.mutations() > threshold {
                self.store.checkpoint()?;
                threshold += self.settings.commit_chunk;
                reporter.on_reconcile_checkpoint(counters.inserted, counters.updated);
            }
        }

        // Catalog exhausted first: everything left is new. The candidate
        // list exhausting first needs nothing; remaining records stand.
        if let Some(c) = candidate {
            let tail: Vec<MediaCandidate> = std::iter::once(c).chain(candidates).collect();
            for chunk in tail.chunks(self.settings.insert_batch) {
                counters.inserted += self.store.insert_batch(chunk)?;
                if counters.mutations() > threshold {
                    self.store.checkpoint()?;
                    threshold += self.settings.commit_chunk;
                    reporter.on_reconcile_checkpoint(counters.inserted, counters.updated);
                }
            }
        }

        self.store.finish()?;
        info!(
            "Reconciliation done: {} inserted, {} updated, {} present here, {} elsewhere",
            counters.inserted, counters.updated, counters.exists_here, counters.exists_elsewhere
        );
        Ok(counters)
    }

    fn insert_new(
        &mut self,
        candidate: &MediaCandidate,
        counters: &mut ReconcileCounters,
    ) -> Result<(), Error> {
        match self.store.insert_or_existing(candidate)? {
            InsertOutcome::Inserted(_) => counters.inserted += 1,
            InsertOutcome::Existing(existing) => {
                // A concurrent writer got there first; the merge will not
                // see that row through the cursor, so just account for it.
                debug!(
                    "Insert of '{}' raced with an existing row (id {})",
                    candidate.name, existing.id
                );
                self.note_existing(&existing, counters);
            }
        }
        Ok(())
    }

    fn reconcile_same_name(
        &mut self,
        candidate: MediaCandidate,
        record: &CatalogRecord,
        counters: &mut ReconcileCounters,
    ) -> Result<(), Error> {
        if candidate.size != record.size {
            self.resolve_collision(candidate, counters)
        } else {
            self.reconcile_same_size(&candidate, record, counters)
        }
    }

    /// Same name, same size: plausibly the same file. Identity is
    /// confirmed by modification-time equality or fingerprint equality;
    /// the fingerprint is authoritative but may be absent on either side.
    fn reconcile_same_size(
        &mut self,
        candidate: &MediaCandidate,
        record: &CatalogRecord,
        counters: &mut ReconcileCounters,
    ) -> Result<(), Error> {
        // Fingerprint backfill applies whether or not identity is
        // confirmed below; a record that disagrees keeps its stored hash.
        if record.content_hash.is_none() {
            if let Some(hash) = candidate.content_hash.as_deref() {
                self.store.update_hash(record.id, hash)?;
                counters.updated += 1;
            }
        }

        if !same_content(candidate, record) {
            return Ok(());
        }

        let all_hosts_known = candidate
            .paths
            .keys()
            .all(|host| record.paths.contains_key(host));
        if all_hosts_known {
            match (
                candidate.paths.get(&self.host),
                record.paths.get(&self.host),
            ) {
                (Some(observed), Some(stored)) if observed == stored => {
                    counters.exists_here += 1;
                }
                (Some(observed), Some(_)) => {
                    // Same file, same host, new location: it moved.
                    let mut merged = record.paths.clone();
                    merged.insert(self.host.clone(), observed.clone());
                    self.store.update_paths(record.id, &merged)?;
                    counters.updated += 1;
                }
                _ => counters.exists_elsewhere += 1,
            }
        } else {
            // The same file now exists on at least one additional host.
            let mut merged = record.paths.clone();
            merged.extend(candidate.paths.clone());
            self.store.update_paths(record.id, &merged)?;
            counters.updated += 1;
        }
        Ok(())
    }

    /// Same name, different size: unrelated content under a reused name.
    /// The catalog keeps the name; the candidate goes in under the first
    /// free synthetic name.
    fn resolve_collision(
        &mut self,
        candidate: MediaCandidate,
        counters: &mut ReconcileCounters,
    ) -> Result<(), Error> {
        for probe in 0..self.settings.rename_probe_cap {
            let probe_name = if probe == 0 {
                format!("autorenamed_{}", candidate.name)
            } else {
                format!("autorenamed_{}_{}", probe, candidate.name)
            };

            match self.store.find_by_name(&probe_name)? {
                Some(existing) => {
                    if same_content(&candidate, &existing) {
                        self.note_existing(&existing, counters);
                        return Ok(());
                    }
                    // Different content also parked under this probe name;
                    // try the next suffix.
                }
                None => {
                    let renamed = candidate.renamed(&probe_name);
                    match self.store.insert_or_existing(&renamed)? {
                        InsertOutcome::Inserted(_) => {
                            info!(
                                "Name collision: '{}' stored as '{}'",
                                candidate.name, probe_name
                            );
                            counters.inserted += 1;
                            return Ok(());
                        }
                        InsertOutcome::Existing(existing) => {
                            if same_content(&renamed, &existing) {
                                self.note_existing(&existing, counters);
                                return Ok(());
                            }
                            // Raced against different content; keep probing.
                        }
                    }
                }
            }
        }
        Err(Error::RenameConflict {
            name: candidate.name,
            probes: self.settings.rename_probe_cap,
        })
    }

    fn note_existing(&self, record: &CatalogRecord, counters: &mut ReconcileCounters) {
        if record.paths.contains_key(&self.host) {
            counters.exists_here += 1;
        } else {
            counters.exists_elsewhere += 1;
        }
    }
}

/// Identity rule shared by the same-size branch and the collision probe:
/// equal sizes, plus modification-time or fingerprint equality.
fn same_content(candidate: &MediaCandidate, record: &CatalogRecord) -> bool {
    candidate.size == record.size
        && (candidate.last_modify == record.last_modify
            || (candidate.content_hash.is_some()
                && candidate.content_hash == record.content_hash))
}
