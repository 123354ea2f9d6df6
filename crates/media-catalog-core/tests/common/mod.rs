//! In-memory `CatalogStore` double. Keeps rows in merge order and counts
//! transaction calls so tests can assert on checkpoint discipline.
#![allow(dead_code)]

use media_catalog_core::model::normalized_key;
use media_catalog_core::storage::{CatalogStore, InsertOutcome, PageKey};
use media_catalog_core::{CatalogRecord, Error, HostPaths, MediaCandidate};
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryCatalog {
    rows: BTreeMap<(String, String), CatalogRecord>,
    next_id: i64,
    pub begins: usize,
    pub checkpoints: usize,
    pub finishes: usize,
}

impl MemoryCatalog {
    pub fn new() -> MemoryCatalog {
        MemoryCatalog::default()
    }

    pub fn with_records(records: Vec<CatalogRecord>) -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        for record in records {
            catalog.next_id = catalog.next_id.max(record.id);
            catalog.rows.insert(
                (record.normalized_key().to_string(), record.name.clone()),
                record,
            );
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, name: &str) -> Option<&CatalogRecord> {
        self.rows.get(&(normalized_key(name), name.to_string()))
    }

    fn store(&mut self, candidate: &MediaCandidate) -> i64 {
        self.next_id += 1;
        let record = record_from(self.next_id, candidate);
        self.rows.insert(
            (record.normalized_key().to_string(), record.name.clone()),
            record,
        );
        self.next_id
    }
}

pub fn record_from(id: i64, candidate: &MediaCandidate) -> CatalogRecord {
    let metadata: BTreeMap<String, String> = candidate
        .metadata
        .iter()
        .map(|(tag, value)| (tag.name().to_string(), value.clone()))
        .collect();
    CatalogRecord::new(
        id,
        candidate.name.clone(),
        candidate.created_at,
        candidate.last_modify,
        candidate.size,
        candidate.content_hash.clone(),
        candidate.media_type.clone(),
        serde_json::to_value(metadata).unwrap(),
        candidate.paths.clone(),
    )
}

impl CatalogStore for MemoryCatalog {
    fn has_records(&mut self) -> Result<bool, Error> {
        Ok(!self.rows.is_empty())
    }

    fn fetch_page(
        &mut self,
        after: Option<&PageKey>,
        limit: i64,
    ) -> Result<Vec<CatalogRecord>, Error> {
        let page = match after {
            Some(key) => {
                let start = (key.normalized.clone(), key.name.clone());
                self.rows
                    .range(start..)
                    .filter(|((normalized, name), _)| {
                        (normalized.as_str(), name.as_str())
                            > (key.normalized.as_str(), key.name.as_str())
                    })
                    .take(limit as usize)
                    .map(|(_, record)| record.clone())
                    .collect()
            }
            None => self
                .rows
                .values()
                .take(limit as usize)
                .cloned()
                .collect(),
        };
        Ok(page)
    }

    fn find_by_name(&mut self, name: &str) -> Result<Option<CatalogRecord>, Error> {
        Ok(self
            .rows
            .get(&(normalized_key(name), name.to_string()))
            .cloned())
    }

    fn insert_or_existing(&mut self, candidate: &MediaCandidate) -> Result<InsertOutcome, Error> {
        if let Some(existing) = self.find_by_name(&candidate.name)? {
            return Ok(InsertOutcome::Existing(existing));
        }
        Ok(InsertOutcome::Inserted(self.store(candidate)))
    }

    fn insert_batch(&mut self, candidates: &[MediaCandidate]) -> Result<usize, Error> {
        for candidate in candidates {
            self.store(candidate);
        }
        Ok(candidates.len())
    }

    fn update_paths(&mut self, id: i64, paths: &HostPaths) -> Result<(), Error> {
        for record in self.rows.values_mut() {
            if record.id == id {
                record.paths = paths.clone();
                return Ok(());
            }
        }
        Err(Error::Other(format!("no record with id {}", id)))
    }

    fn update_hash(&mut self, id: i64, hash: &str) -> Result<(), Error> {
        for record in self.rows.values_mut() {
            if record.id == id {
                record.content_hash = Some(hash.to_string());
                return Ok(());
            }
        }
        Err(Error::Other(format!("no record with id {}", id)))
    }

    fn begin(&mut self) -> Result<(), Error> {
        self.begins += 1;
        Ok(())
    }

    fn checkpoint(&mut self) -> Result<(), Error> {
        self.checkpoints += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        self.finishes += 1;
        Ok(())
    }
}
