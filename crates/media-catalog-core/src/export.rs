//! Portable media catalog interchange: the full candidate set as one JSON
//! array in a `media.json` entry inside a deflate-compressed zip. Written
//! when `primary-fill` runs without a database; read back by
//! `incremental-fill --source-file`.

use crate::error::Error;
use crate::metadata::MetaTag;
use crate::model::{HostPaths, MediaCandidate};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MEDIA_ENTRY: &str = "media.json";

/// Wire form of one candidate. Timestamps travel as epoch milliseconds
/// and metadata keys as plain tag names, so the format stays readable
/// from other tooling.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaExport {
    name: String,
    created_at: i64,
    last_modify: i64,
    size: i64,
    #[serde(rename = "type")]
    media_type: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    paths: HostPaths,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
}

impl From<&MediaCandidate> for MediaExport {
    fn from(c: &MediaCandidate) -> Self {
        MediaExport {
            name: c.name.clone(),
            created_at: c.created_at.and_utc().timestamp_millis(),
            last_modify: c.last_modify.and_utc().timestamp_millis(),
            size: c.size,
            media_type: c.media_type.clone(),
            metadata: c
                .metadata
                .iter()
                .map(|(tag, value)| (tag.name().to_string(), value.clone()))
                .collect(),
            paths: c.paths.clone(),
            hash: c.content_hash.clone(),
        }
    }
}

/// Serialize the candidate set into `media.zip`-style output at `path`.
pub fn write_media_file(path: &Path, candidates: &[MediaCandidate]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut archive = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file(MEDIA_ENTRY, options)?;
    let exports: Vec<MediaExport> = candidates.iter().map(MediaExport::from).collect();
    serde_json::to_writer(&mut archive, &exports)?;
    archive.finish()?;
    info!("Wrote {} media entries to {}", exports.len(), path.display());
    Ok(())
}

/// Read a previously exported media file back into sorted candidates.
/// Unknown metadata tags are dropped with a warning rather than failing
/// the whole import.
pub fn read_media_file(path: &Path) -> Result<Vec<MediaCandidate>, Error> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    // Older exports may carry a differently named single entry.
    let entry_index = archive.index_for_name(MEDIA_ENTRY).unwrap_or(0);
    let entry = archive.by_index(entry_index)?;
    let exports: Vec<MediaExport> = serde_json::from_reader(BufReader::new(entry))?;

    let mut candidates: Vec<MediaCandidate> = exports
        .into_iter()
        .map(import_candidate)
        .collect::<Result<_, Error>>()?;
    candidates.sort_unstable_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    info!(
        "Read {} media entries from {}",
        candidates.len(),
        path.display()
    );
    Ok(candidates)
}

fn import_candidate(export: MediaExport) -> Result<MediaCandidate, Error> {
    let mut metadata = BTreeMap::new();
    for (key, value) in export.metadata {
        match MetaTag::from_name(&key) {
            Some(tag) => {
                metadata.insert(tag, value);
            }
            None => warn!("Skipping unknown metadata tag '{}' on '{}'", key, export.name),
        }
    }
    Ok(MediaCandidate::new(
        export.name.clone(),
        millis_to_naive(export.created_at, &export.name)?,
        millis_to_naive(export.last_modify, &export.name)?,
        export.size,
        export.media_type,
        metadata,
        export.paths,
        export.hash,
        None,
    ))
}

fn millis_to_naive(millis: i64, name: &str) -> Result<NaiveDateTime, Error> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| Error::Other(format!("timestamp {} out of range on '{}'", millis, name)))
}
