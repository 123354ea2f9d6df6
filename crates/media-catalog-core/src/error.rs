use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Root directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("Name collision for '{name}' unresolved after {probes} rename probes")]
    RenameConflict { name: String, probes: u32 },

    #[error("{0}")]
    Other(String),
}
