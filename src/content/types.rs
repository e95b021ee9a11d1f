//! Content catalog data types

use serde::{Deserialize, Serialize};

/// Media type of the only fragment kind pointers can address
pub const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// One entry of a book's reading order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Locator of the fragment, usually an absolute URL
    pub href: String,
    /// Media type of the fragment
    #[serde(rename = "type")]
    pub media_type: String,
}

impl ManifestEntry {
    pub fn new(href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            media_type: media_type.into(),
        }
    }

    /// Check if pointers can be resolved inside this fragment
    pub fn is_xhtml(&self) -> bool {
        self.media_type == XHTML_MEDIA_TYPE
    }
}

/// A book's reading-order manifest (web publication manifest subset)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingOrderManifest {
    #[serde(rename = "readingOrder", default)]
    pub reading_order: Vec<ManifestEntry>,
}

impl ReadingOrderManifest {
    /// Number of fragments in the reading order
    pub fn len(&self) -> usize {
        self.reading_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reading_order.is_empty()
    }

    /// Get a fragment by 0-based reading-order index
    pub fn fragment(&self, index: u64) -> Option<&ManifestEntry> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.reading_order.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_deserialize() {
        let json = r#"{
            "metadata": {"title": "Ignored"},
            "readingOrder": [
                {"href": "https://komga.local/api/v1/books/0A/resource/ch1.xhtml", "type": "application/xhtml+xml"},
                {"href": "https://komga.local/api/v1/books/0A/resource/cover.jpg", "type": "image/jpeg"}
            ]
        }"#;

        let manifest: ReadingOrderManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.len(), 2);
        assert!(manifest.fragment(0).unwrap().is_xhtml());
        assert!(!manifest.fragment(1).unwrap().is_xhtml());
        assert!(manifest.fragment(2).is_none());
    }

    #[test]
    fn test_manifest_without_reading_order() {
        let manifest: ReadingOrderManifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.is_empty());
    }
}
