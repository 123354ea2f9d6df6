use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "media-catalog")]
#[command(about = "Cross-host media catalog with rename-aware reconciliation", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Collect media under a directory and load an empty catalog with it.
    /// Without --pg-settings the result is written to media.zip instead.
    PrimaryFill {
        /// Directory tree to collect media files from
        root_dir: PathBuf,
        /// Settings file for the catalog database; omit to export media.zip
        #[arg(long)]
        pg_settings: Option<PathBuf>,
        /// Collect and enrich with a thread pool
        #[arg(long)]
        parallel: bool,
        /// Fingerprint file contents during collection
        #[arg(long)]
        calculate_hash: bool,
        /// Host identity recorded in catalog paths; defaults to this machine
        #[arg(long)]
        host: Option<String>,
    },
    /// Reconcile media from a directory or an exported media file against
    /// the catalog.
    #[command(group(
        ArgGroup::new("source")
            .required(true)
            .args(["root_dir", "source_file"]),
    ))]
    IncrementalFill {
        /// Directory tree to collect media files from
        #[arg(long)]
        root_dir: Option<PathBuf>,
        /// Previously exported media.zip to read candidates from
        #[arg(long)]
        source_file: Option<PathBuf>,
        /// Settings file for the catalog database
        #[arg(long)]
        pg_settings: PathBuf,
        /// Collect and enrich with a thread pool
        #[arg(long)]
        parallel: bool,
        /// Fingerprint file contents during collection
        #[arg(long)]
        calculate_hash: bool,
        /// Host identity recorded in catalog paths; defaults to this machine
        #[arg(long)]
        host: Option<String>,
    },
    /// Print configuration values
    PrintConfig,
}
