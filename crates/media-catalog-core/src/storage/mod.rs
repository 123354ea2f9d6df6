mod pg;
pub mod schema;

pub use pg::PgCatalog;

use crate::error::Error;
use crate::model::{CatalogRecord, HostPaths, MediaCandidate};

/// Keyset position of the catalog cursor: the sort key of the last record
/// a page returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageKey {
    pub normalized: String,
    pub name: String,
}

impl PageKey {
    pub fn of(record: &CatalogRecord) -> PageKey {
        PageKey {
            normalized: record.normalized_key().to_string(),
            name: record.name.clone(),
        }
    }
}

/// Result of the atomic insert primitive.
#[derive(Debug)]
pub enum InsertOutcome {
    /// A new row was created.
    Inserted(i64),
    /// The name was already taken; here is the row that holds it.
    Existing(CatalogRecord),
}

/// Storage seam the reconciliation engine drives. One implementation talks
/// to Postgres; tests supply an in-memory double.
///
/// Methods take `&mut self` because the engine is single-threaded and owns
/// one connection for the whole run.
pub trait CatalogStore {
    /// Cheap existence probe; used to refuse a primary fill against a
    /// catalog that already has rows.
    fn has_records(&mut self) -> Result<bool, Error>;

    /// One bounded page of records in ascending (normalized key, name)
    /// order, strictly after `after`. An empty page means exhausted.
    fn fetch_page(&mut self, after: Option<&PageKey>, limit: i64)
        -> Result<Vec<CatalogRecord>, Error>;

    fn find_by_name(&mut self, name: &str) -> Result<Option<CatalogRecord>, Error>;

    /// Insert the candidate, or return the row that already holds its name.
    /// Atomic with respect to concurrent writers.
    fn insert_or_existing(&mut self, candidate: &MediaCandidate) -> Result<InsertOutcome, Error>;

    /// Bulk insert for the tail case; names are known not to exist.
    fn insert_batch(&mut self, candidates: &[MediaCandidate]) -> Result<usize, Error>;

    fn update_paths(&mut self, id: i64, paths: &HostPaths) -> Result<(), Error>;

    fn update_hash(&mut self, id: i64, hash: &str) -> Result<(), Error>;

    /// Open the run-scoped transaction.
    fn begin(&mut self) -> Result<(), Error>;

    /// Intermediate commit; the transaction is reopened so the run can
    /// continue. Bounds transaction/log size on large runs.
    fn checkpoint(&mut self) -> Result<(), Error>;

    /// Final commit at the end of the run.
    fn finish(&mut self) -> Result<(), Error>;
}
