//! Post-collection enrichment: metadata application and lazy fingerprint
//! computation. Both passes are bulk, order-preserving, and tolerate being
//! skipped entirely; reconciliation falls back to modification-time
//! equality when no hash was computed.

use crate::classify::TYPE_IMAGE;
use crate::dates;
use crate::metadata;
use crate::model::{ExecMode, MediaCandidate};
use crate::progress::{report_step, ProgressReporter};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{error, info};

/// Extract and attach metadata for every image candidate that still has a
/// local file behind it. Extraction failures leave the metadata empty and
/// are never fatal.
pub fn apply_metadata(
    candidates: Vec<MediaCandidate>,
    mode: ExecMode,
    reporter: &dyn ProgressReporter,
) -> Vec<MediaCandidate> {
    let total = candidates.len();
    info!("Start extracting metadata (parallel={})", mode.is_parallel());
    reporter.on_metadata_start(total);
    let start = Instant::now();
    let progress = AtomicUsize::new(0);
    let step = report_step(total);

    let enrich = |candidate: MediaCandidate| {
        let enriched = enrich_one(candidate);
        let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
        if done % step == 0 {
            info!("Progress {}/{}", done, total);
            reporter.on_metadata_progress(done, total);
        }
        enriched
    };

    let enriched: Vec<MediaCandidate> = match mode {
        ExecMode::Parallel => candidates.into_par_iter().map(enrich).collect(),
        ExecMode::Sequential => candidates.into_iter().map(enrich).collect(),
    };

    info!("Finish extracting metadata");
    reporter.on_metadata_complete(start.elapsed().as_secs_f64());
    enriched
}

fn enrich_one(candidate: MediaCandidate) -> MediaCandidate {
    if candidate.media_type != TYPE_IMAGE {
        return candidate;
    }
    let Some(path) = candidate.local_path.clone() else {
        return candidate;
    };
    let tags = metadata::extract(&path, &candidate.media_type);
    if tags.is_empty() {
        return candidate;
    }
    let created_at = dates::create_date_from(&tags, &candidate.name);
    candidate.with_metadata(tags, created_at)
}

/// Compute the content fingerprint for every candidate that does not have
/// one yet. Hash failures are logged per file; the candidate keeps a null
/// hash and reconciliation falls back to `last_modify` equality.
pub fn compute_hashes(
    candidates: Vec<MediaCandidate>,
    mode: ExecMode,
    reporter: &dyn ProgressReporter,
) -> Vec<MediaCandidate> {
    let total = candidates.len();
    info!("Calculating fingerprints for {} files", total);
    reporter.on_hash_start(total);
    let start = Instant::now();
    let progress = AtomicUsize::new(0);
    let hashed = AtomicUsize::new(0);
    let step = report_step(total);

    let hash = |candidate: MediaCandidate| {
        let hashed_candidate = hash_one(candidate, &hashed);
        let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
        if done % step == 0 {
            info!("Progress {}/{}", done, total);
            reporter.on_hash_progress(done, total);
        }
        hashed_candidate
    };

    let out: Vec<MediaCandidate> = match mode {
        ExecMode::Parallel => candidates.into_par_iter().map(hash).collect(),
        ExecMode::Sequential => candidates.into_iter().map(hash).collect(),
    };

    let duration = start.elapsed();
    info!(
        "Fingerprints calculated for {} files in {:.2}s",
        hashed.load(Ordering::Relaxed),
        duration.as_secs_f64()
    );
    reporter.on_hash_complete(hashed.load(Ordering::Relaxed), duration.as_secs_f64());
    out
}

fn hash_one(candidate: MediaCandidate, hashed: &AtomicUsize) -> MediaCandidate {
    if candidate.content_hash.is_some() {
        return candidate;
    }
    let Some(path) = candidate.local_path.clone() else {
        return candidate;
    };
    match fingerprint_file(&path) {
        Ok(hash) => {
            hashed.fetch_add(1, Ordering::Relaxed);
            candidate.with_content_hash(hash)
        }
        Err(err) => {
            error!("Error hashing file {}: {}", path.display(), err);
            candidate
        }
    }
}

/// Streamed blake3 fingerprint of the file contents, as a hex string.
pub fn fingerprint_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
