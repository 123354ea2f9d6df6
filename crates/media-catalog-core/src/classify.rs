use std::collections::BTreeMap;

/// Type tag for still images; drives metadata extraction.
pub const TYPE_IMAGE: &str = "i";
/// Type tag for video files.
pub const TYPE_VIDEO: &str = "v";

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "heic", "heif", "tif", "tiff", "dng", "cr2",
    "nef", "arw", "orf", "rw2",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "mts", "m2ts", "3gp", "wmv", "mpg", "mpeg", "webm",
];

/// Lookup table from lowercase file extension to media type tag. A miss is
/// not an error; the file is simply unsupported.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: BTreeMap<String, String>,
}

impl TypeTable {
    /// Table with the built-in extension set.
    pub fn built_in() -> Self {
        let mut types = BTreeMap::new();
        for ext in IMAGE_EXTENSIONS {
            types.insert((*ext).to_string(), TYPE_IMAGE.to_string());
        }
        for ext in VIDEO_EXTENSIONS {
            types.insert((*ext).to_string(), TYPE_VIDEO.to_string());
        }
        TypeTable { types }
    }

    /// Overlay externally configured mappings on top of the built-ins.
    pub fn with_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        for (ext, tag) in overrides {
            self.types.insert(ext.to_lowercase(), tag);
        }
        self
    }

    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.types.get(extension).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Lowercased extension of a file name; empty string when the name has no
/// dot at all.
pub fn extension_of(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}
