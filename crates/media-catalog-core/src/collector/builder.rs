use crate::classify::{extension_of, TypeTable};
use crate::dates;
use crate::model::MediaCandidate;
use chrono::{DateTime, NaiveDateTime, Utc};
use dashmap::DashSet;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tracing::error;

/// Turn one regular file into a candidate. Unsupported extensions are
/// accumulated for a single summary warning; per-file read failures are
/// logged and skip only that file.
pub(crate) fn process_file(
    path: &Path,
    types: &TypeTable,
    host: &str,
    unsupported: &DashSet<String>,
) -> Option<MediaCandidate> {
    let file_name = path.file_name()?.to_string_lossy().into_owned();
    let extension = extension_of(&file_name);
    let Some(media_type) = types.lookup(&extension) else {
        unsupported.insert(extension);
        return None;
    };
    match build_candidate(path, file_name, media_type, host) {
        Ok(candidate) => Some(candidate),
        Err(err) => {
            error!("Error on file {}: {}", path.display(), err);
            None
        }
    }
}

fn build_candidate(
    path: &Path,
    file_name: String,
    media_type: &str,
    host: &str,
) -> io::Result<MediaCandidate> {
    let attributes = std::fs::metadata(path)?;
    let last_modify = to_naive(attributes.modified()?);

    // Name-derived date first; filesystem creation time is the fallback
    // and itself falls back to mtime where the platform has no birth time.
    let created_at = dates::create_date_from(&BTreeMap::new(), &file_name)
        .unwrap_or_else(|| attributes.created().map(to_naive).unwrap_or(last_modify));

    let absolute = std::path::absolute(path)?;
    let paths = BTreeMap::from([(
        host.to_string(),
        absolute.to_string_lossy().into_owned(),
    )]);

    Ok(MediaCandidate::new(
        file_name,
        created_at,
        last_modify,
        attributes.len() as i64,
        media_type.to_string(),
        BTreeMap::new(),
        paths,
        None,
        Some(absolute),
    ))
}

fn to_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Utc>::from(time).naive_utc()
}
