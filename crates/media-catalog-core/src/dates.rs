use crate::metadata::MetaTag;
use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref DATE_FULL_PATTERN: Regex = Regex::new(r"([0-9]{8}_[0-9]{6})").unwrap();
    static ref DATE_SHORT_PATTERN: Regex = Regex::new(r"([0-9]{8})").unwrap();
}

/// Infer a creation date, in priority order: full timestamp embedded in
/// the file name, `DateTimeOriginal` metadata, bare date in the file name.
/// Returns `None` when nothing parses; the caller falls back to filesystem
/// times.
pub fn create_date_from(
    tags: &BTreeMap<MetaTag, String>,
    file_name: &str,
) -> Option<NaiveDateTime> {
    if let Some(captures) = DATE_FULL_PATTERN.captures(file_name) {
        // A full-timestamp looking name that fails to parse yields nothing;
        // a bare-date fallback would mis-date such files.
        return NaiveDateTime::parse_from_str(&captures[1], "%Y%m%d_%H%M%S").ok();
    }

    if let Some(value) = tags.get(&MetaTag::DateTimeOriginal) {
        if let Some(parsed) = parse_metadata_datetime(value) {
            return Some(parsed);
        }
    }

    if let Some(captures) = DATE_SHORT_PATTERN.captures(file_name) {
        if let Ok(date) = NaiveDate::parse_from_str(&captures[1], "%Y%m%d") {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// `DateTimeOriginal` values arrive either in Exif form
/// (`2021:10:02 14:34:34`) or in the compact quoted form older exports
/// carry (`'20211002 143434'`).
fn parse_metadata_datetime(value: &str) -> Option<NaiveDateTime> {
    let cleaned = value.replace('\'', "");
    let cleaned = cleaned.trim();
    NaiveDateTime::parse_from_str(cleaned, "%Y:%m:%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(cleaned, "%Y%m%d %H%M%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(value: &str) -> BTreeMap<MetaTag, String> {
        BTreeMap::from([(MetaTag::DateTimeOriginal, value.to_string())])
    }

    #[test]
    fn full_filename_timestamp_wins() {
        let result = create_date_from(&tags("2019:01:01 00:00:00"), "IMG_20211002_143434.jpg");
        assert_eq!(
            result,
            NaiveDate::from_ymd_opt(2021, 10, 2)
                .unwrap()
                .and_hms_opt(14, 34, 34)
        );
    }

    #[test]
    fn metadata_beats_short_filename_date() {
        let result = create_date_from(&tags("2019:05:06 07:08:09"), "scan_20211002.jpg");
        assert_eq!(
            result,
            NaiveDate::from_ymd_opt(2019, 5, 6).unwrap().and_hms_opt(7, 8, 9)
        );
    }

    #[test]
    fn quoted_compact_metadata_form_parses() {
        let result = create_date_from(&tags("'20211002 143434'"), "photo.jpg");
        assert_eq!(
            result,
            NaiveDate::from_ymd_opt(2021, 10, 2)
                .unwrap()
                .and_hms_opt(14, 34, 34)
        );
    }

    #[test]
    fn short_filename_date_is_midnight() {
        let result = create_date_from(&BTreeMap::new(), "VID-20220317-WA0001.mp4");
        assert_eq!(
            result,
            NaiveDate::from_ymd_opt(2022, 3, 17).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn implausible_digits_yield_none() {
        assert_eq!(create_date_from(&BTreeMap::new(), "cut_99999999.mp4"), None);
        assert_eq!(create_date_from(&BTreeMap::new(), "plain-name.jpg"), None);
    }
}
