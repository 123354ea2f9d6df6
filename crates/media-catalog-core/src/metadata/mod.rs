mod tag;

pub use tag::{normalize_value, MetaTag};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::warn;

/// Extract the metadata map for a file. Only image types carry metadata;
/// anything else gets an empty map. Malformed or absent metadata is never
/// fatal; it is logged and an empty map is returned.
pub fn extract(path: &Path, media_type: &str) -> BTreeMap<MetaTag, String> {
    if media_type != crate::classify::TYPE_IMAGE {
        return BTreeMap::new();
    }
    match read_exif_tags(path) {
        Ok(tags) => tags,
        Err(err) => {
            warn!("Image {} metadata error: {}", path.display(), err);
            BTreeMap::new()
        }
    }
}

fn read_exif_tags(path: &Path) -> Result<BTreeMap<MetaTag, String>, exif::Error> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader)?;

    let mut tags: BTreeMap<MetaTag, String> = BTreeMap::new();
    for field in exif.fields() {
        if field.ifd_num != exif::In::PRIMARY {
            continue;
        }
        if let Some(tag) = MetaTag::from_name(&field.tag.to_string()) {
            let value = normalize_value(tag, &field.display_value().to_string());
            tags.entry(tag).or_insert(value);
        }
    }
    promote_exif_dimensions(&mut tags);
    Ok(tags)
}

/// The catalog stores pixel dimensions under `ImageWidth`/`ImageLength`.
/// When the Exif sub-IFD variants are present they are authoritative and
/// replace whatever the primary IFD reported.
fn promote_exif_dimensions(tags: &mut BTreeMap<MetaTag, String>) {
    if let Some(width) = tags.remove(&MetaTag::ExifImageWidth) {
        tags.insert(MetaTag::ImageWidth, width);
    }
    if let Some(length) = tags.remove(&MetaTag::ExifImageLength) {
        tags.insert(MetaTag::ImageLength, length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_image_types_have_no_metadata() {
        let tags = extract(Path::new("/nonexistent/movie.mp4"), "v");
        assert!(tags.is_empty());
    }

    #[test]
    fn unreadable_image_yields_empty_map() {
        let tags = extract(Path::new("/nonexistent/photo.jpg"), "i");
        assert!(tags.is_empty());
    }

    #[test]
    fn exif_dimensions_replace_primary_ones() {
        let mut tags = BTreeMap::from([
            (MetaTag::ImageWidth, "640".to_string()),
            (MetaTag::ExifImageWidth, "4032".to_string()),
            (MetaTag::ExifImageLength, "3024".to_string()),
        ]);
        promote_exif_dimensions(&mut tags);
        assert_eq!(tags.get(&MetaTag::ImageWidth).map(String::as_str), Some("4032"));
        assert_eq!(tags.get(&MetaTag::ImageLength).map(String::as_str), Some("3024"));
        assert!(!tags.contains_key(&MetaTag::ExifImageWidth));
    }
}
