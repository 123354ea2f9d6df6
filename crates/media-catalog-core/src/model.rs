use crate::metadata::MetaTag;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Map of host identity → absolute path on that host.
pub type HostPaths = BTreeMap<String, String>;

/// Execution mode for the collection and enrichment phases.
/// Reconciliation itself is always sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    Parallel,
}

impl ExecMode {
    pub fn is_parallel(self) -> bool {
        matches!(self, ExecMode::Parallel)
    }
}

/// Strip the separator characters from a name. The result is used only to
/// establish a total order for the merge, never as an identity.
pub fn normalized_key(name: &str) -> String {
    name.replace('-', "").replace('_', "")
}

/// A media file observed during the current run, not yet reconciled with
/// the catalog. Immutable; renames and computed fingerprints go through
/// the `renamed` / `with_content_hash` transformations.
#[derive(Debug, Clone)]
pub struct MediaCandidate {
    pub name: String,
    pub created_at: NaiveDateTime,
    pub last_modify: NaiveDateTime,
    pub size: i64,
    pub media_type: String,
    pub metadata: BTreeMap<MetaTag, String>,
    pub paths: HostPaths,
    pub content_hash: Option<String>,
    /// Local file behind this candidate, kept so the fingerprint can be
    /// computed after collection without re-walking the filesystem.
    /// Absent for candidates read back from an exported media file.
    pub local_path: Option<PathBuf>,
    normalized: String,
}

impl MediaCandidate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        created_at: NaiveDateTime,
        last_modify: NaiveDateTime,
        size: i64,
        media_type: String,
        metadata: BTreeMap<MetaTag, String>,
        paths: HostPaths,
        content_hash: Option<String>,
        local_path: Option<PathBuf>,
    ) -> Self {
        debug_assert!(!paths.is_empty(), "candidate must carry at least one path");
        let normalized = normalized_key(&name);
        MediaCandidate {
            name,
            created_at,
            last_modify,
            size,
            media_type,
            metadata,
            paths,
            content_hash,
            local_path,
            normalized,
        }
    }

    pub fn normalized_key(&self) -> &str {
        &self.normalized
    }

    /// Total order for the merge: normalized key, then raw name as tie-break.
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.normalized, &self.name)
    }

    pub fn with_content_hash(mut self, hash: String) -> Self {
        self.content_hash = Some(hash);
        self
    }

    /// Attach extracted metadata, optionally replacing the inferred
    /// creation date with one derived from the metadata.
    pub fn with_metadata(
        mut self,
        metadata: BTreeMap<MetaTag, String>,
        created_at: Option<NaiveDateTime>,
    ) -> Self {
        self.metadata = metadata;
        if let Some(created_at) = created_at {
            self.created_at = created_at;
        }
        self
    }

    /// Same candidate under a synthetic name, used by collision resolution.
    pub fn renamed(&self, name: &str) -> Self {
        let mut renamed = self.clone();
        renamed.name = name.to_string();
        renamed.normalized = normalized_key(name);
        renamed
    }
}

/// A persisted catalog row, read through the catalog cursor.
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub last_modify: NaiveDateTime,
    pub size: i64,
    pub content_hash: Option<String>,
    pub media_type: String,
    pub metadata: serde_json::Value,
    pub paths: HostPaths,
    normalized: String,
}

impl CatalogRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        name: String,
        created_at: NaiveDateTime,
        last_modify: NaiveDateTime,
        size: i64,
        content_hash: Option<String>,
        media_type: String,
        metadata: serde_json::Value,
        paths: HostPaths,
    ) -> Self {
        let normalized = normalized_key(&name);
        CatalogRecord {
            id,
            name,
            created_at,
            last_modify,
            size,
            content_hash,
            media_type,
            metadata,
            paths,
            normalized,
        }
    }

    pub fn normalized_key(&self) -> &str {
        &self.normalized
    }

    pub fn sort_key(&self) -> (&str, &str) {
        (&self.normalized, &self.name)
    }
}
