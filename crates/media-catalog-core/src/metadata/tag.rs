use std::fmt;

/// Closed set of metadata tags the catalog stores. Anything an extractor
/// reports outside this set is rejected explicitly, not carried along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaTag {
    ExifImageWidth,
    ImageWidth,
    ExifImageLength,
    ImageLength,
    DateTimeOriginal,
    Make,
    Model,
    GpsLatitude,
    GpsLatitudeRef,
    GpsLongitude,
    GpsLongitudeRef,
    Software,
    Orientation,
}

impl MetaTag {
    /// Stable catalog name of the tag.
    pub fn name(self) -> &'static str {
        match self {
            MetaTag::ExifImageWidth => "ExifImageWidth",
            MetaTag::ImageWidth => "ImageWidth",
            MetaTag::ExifImageLength => "ExifImageLength",
            MetaTag::ImageLength => "ImageLength",
            MetaTag::DateTimeOriginal => "DateTimeOriginal",
            MetaTag::Make => "Make",
            MetaTag::Model => "Model",
            MetaTag::GpsLatitude => "GPSLatitude",
            MetaTag::GpsLatitudeRef => "GPSLatitudeRef",
            MetaTag::GpsLongitude => "GPSLongitude",
            MetaTag::GpsLongitudeRef => "GPSLongitudeRef",
            MetaTag::Software => "Software",
            MetaTag::Orientation => "Orientation",
        }
    }

    /// Resolve a reported tag name. Accepts the Exif standard names for
    /// the pixel dimension tags as aliases.
    pub fn from_name(name: &str) -> Option<MetaTag> {
        match name {
            "ExifImageWidth" | "PixelXDimension" => Some(MetaTag::ExifImageWidth),
            "ImageWidth" => Some(MetaTag::ImageWidth),
            "ExifImageLength" | "PixelYDimension" => Some(MetaTag::ExifImageLength),
            "ImageLength" => Some(MetaTag::ImageLength),
            "DateTimeOriginal" => Some(MetaTag::DateTimeOriginal),
            "Make" => Some(MetaTag::Make),
            "Model" => Some(MetaTag::Model),
            "GPSLatitude" => Some(MetaTag::GpsLatitude),
            "GPSLatitudeRef" => Some(MetaTag::GpsLatitudeRef),
            "GPSLongitude" => Some(MetaTag::GpsLongitude),
            "GPSLongitudeRef" => Some(MetaTag::GpsLongitudeRef),
            "Software" => Some(MetaTag::Software),
            "Orientation" => Some(MetaTag::Orientation),
            _ => None,
        }
    }
}

impl fmt::Display for MetaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Vendor strings are stored comma-free so the JSON stays unambiguous in
/// downstream tooling; everything else passes through trimmed.
pub fn normalize_value(tag: MetaTag, value: &str) -> String {
    match tag {
        MetaTag::Make | MetaTag::Model | MetaTag::Software => {
            value.replace(',', "").trim().to_string()
        }
        _ => value.trim().to_string(),
    }
}
