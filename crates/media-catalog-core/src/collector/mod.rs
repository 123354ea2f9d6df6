mod builder;

use crate::classify::TypeTable;
use crate::error::Error;
use crate::model::{ExecMode, MediaCandidate};
use crate::progress::ProgressReporter;
use dashmap::DashSet;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Output of one collection pass: candidates in merge order plus the
/// distinct unsupported extensions that were skipped.
#[derive(Debug)]
pub struct CollectedMedia {
    pub candidates: Vec<MediaCandidate>,
    pub unsupported_extensions: BTreeSet<String>,
}

/// Walk `root`, build a candidate per supported regular file and return
/// them sorted ascending by (normalized key, name), the total order the
/// reconciliation merge depends on.
pub fn collect_from_dir(
    root: &Path,
    mode: ExecMode,
    types: &TypeTable,
    host: &str,
    reporter: &dyn ProgressReporter,
) -> Result<CollectedMedia, Error> {
    if !root.is_dir() {
        return Err(Error::MissingRoot(root.to_path_buf()));
    }

    reporter.on_collect_start();
    let start = Instant::now();

    let files = enumerate_files(root);
    let unsupported: DashSet<String> = DashSet::new();

    let mut candidates: Vec<MediaCandidate> = match mode {
        ExecMode::Parallel => files
            .par_iter()
            .filter_map(|path| builder::process_file(path, types, host, &unsupported))
            .collect(),
        ExecMode::Sequential => files
            .iter()
            .filter_map(|path| builder::process_file(path, types, host, &unsupported))
            .collect(),
    };

    candidates.sort_unstable_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let unsupported_extensions: BTreeSet<String> = unsupported.into_iter().collect();
    if !unsupported_extensions.is_empty() {
        warn!("Unsupported extensions: {:?}", unsupported_extensions);
    }
    info!("Found {} media files", candidates.len());
    reporter.on_collect_complete(candidates.len(), start.elapsed().as_secs_f64());

    Ok(CollectedMedia {
        candidates,
        unsupported_extensions,
    })
}

fn enumerate_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}
