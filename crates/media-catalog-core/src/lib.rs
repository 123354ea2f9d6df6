//! Media catalog core: collects media files from a directory tree,
//! enriches them with image metadata and content fingerprints, and
//! reconciles them against a PostgreSQL-backed catalog shared across
//! hosts. The catalog tracks, per file, every host and path where the
//! same content has been seen.

pub mod classify;
pub mod collector;
pub mod config;
pub mod dates;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod export;
pub mod metadata;
pub mod model;
pub mod progress;
pub mod storage;

pub use config::{AppConfig, DatabaseConfig, EngineConfig};
pub use engine::{primary_fill, PrimaryFillOutcome, ReconcileCounters, ReconcileEngine};
pub use error::Error;
pub use model::{CatalogRecord, ExecMode, HostPaths, MediaCandidate};
pub use progress::{ProgressReporter, SilentReporter};
pub use storage::{CatalogStore, InsertOutcome, PageKey, PgCatalog};
