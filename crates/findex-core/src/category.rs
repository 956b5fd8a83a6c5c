//! File categories and the static extension lookup table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of an indexed file, determined by extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Document,
    Image,
    Audio,
    Video,
    Archive,
    Ebook,
    Text,
    Other,
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileCategory::Document => "document",
            FileCategory::Image => "image",
            FileCategory::Audio => "audio",
            FileCategory::Video => "video",
            FileCategory::Archive => "archive",
            FileCategory::Ebook => "ebook",
            FileCategory::Text => "text",
            FileCategory::Other => "other",
        };
        f.write_str(s)
    }
}

/// Static extension table. First matching category wins, so `.txt`
/// classifies as Document rather than Text, matching the lookup order.
const EXTENSION_TABLE: &[(FileCategory, &[&str])] = &[
    (
        FileCategory::Document,
        &[
            ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".pdf", ".rtf", ".txt", ".html",
            ".htm",
        ],
    ),
    (
        FileCategory::Image,
        &[".jpg", ".jpeg", ".png", ".bmp", ".gif", ".ico", ".webp", ".svg"],
    ),
    (
        FileCategory::Audio,
        &[".mp3", ".wav", ".ogg", ".m4a", ".flac", ".aac"],
    ),
    (
        FileCategory::Video,
        &[".mp4", ".mov", ".avi", ".mpeg", ".mpg", ".wmv", ".mkv"],
    ),
    (
        FileCategory::Archive,
        &[".zip", ".rar", ".7z", ".tar", ".gz"],
    ),
    (
        FileCategory::Ebook,
        &[".mobi", ".epub", ".azw3", ".azw", ".fb2"],
    ),
    (
        FileCategory::Text,
        &[".txt", ".md", ".json", ".xml", ".csv", ".log"],
    ),
];

/// Look up the category for a lowercase extension (with leading dot).
///
/// Unknown extensions fall back to [`FileCategory::Other`].
pub fn category_for_extension(extension: &str) -> FileCategory {
    for (category, extensions) in EXTENSION_TABLE {
        if extensions.contains(&extension) {
            return *category;
        }
    }
    FileCategory::Other
}

/// Whether the extension appears anywhere in the supported table.
pub fn is_supported_extension(extension: &str) -> bool {
    EXTENSION_TABLE
        .iter()
        .any(|(_, extensions)| extensions.contains(&extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(category_for_extension(".pdf"), FileCategory::Document);
        assert_eq!(category_for_extension(".png"), FileCategory::Image);
        assert_eq!(category_for_extension(".flac"), FileCategory::Audio);
        assert_eq!(category_for_extension(".mkv"), FileCategory::Video);
        assert_eq!(category_for_extension(".7z"), FileCategory::Archive);
        assert_eq!(category_for_extension(".epub"), FileCategory::Ebook);
        assert_eq!(category_for_extension(".md"), FileCategory::Text);
    }

    #[test]
    fn test_unknown_extension_is_other() {
        assert_eq!(category_for_extension(".xyz"), FileCategory::Other);
        assert_eq!(category_for_extension(""), FileCategory::Other);
    }

    #[test]
    fn test_txt_classifies_as_document() {
        // Document entry precedes Text in the table
        assert_eq!(category_for_extension(".txt"), FileCategory::Document);
    }

    #[test]
    fn test_supported_extension() {
        assert!(is_supported_extension(".md"));
        assert!(!is_supported_extension(".exe"));
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&FileCategory::Document).unwrap();
        assert_eq!(json, "\"document\"");
        let parsed: FileCategory = serde_json::from_str("\"ebook\"").unwrap();
        assert_eq!(parsed, FileCategory::Ebook);
    }
}
