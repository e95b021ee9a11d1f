//! Conversion orchestrator
//!
//! Translates progress between the packed and structural ecosystems by
//! walking the addressed fragment of the book:
//!
//! - structural pointer -> resolve against the fragment -> packed offset
//! - packed offset -> build pointer against the fragment -> structural pointer
//!
//! Every conversion fetches the manifest and fragment afresh; nothing is
//! cached or persisted, and failures are returned as-is without retry.

use std::io::BufReader;

use tracing::{debug, info};

use crate::content::{ContentSource, ContentStream};
use crate::error::{Error, Result};
use crate::pointer::{self, build_pointer_at, resolve_with, LedgerMode, Pointer};
use crate::progress::{percentage_text, validate_percentage, PackedProgress};
use crate::sync::{Device, SyncProgress};

/// Progress converter bound to a content source
pub struct Converter<'a, S: ContentSource + ?Sized> {
    source: &'a S,
    ledger_mode: LedgerMode,
}

impl<'a, S: ContentSource + ?Sized> Converter<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            ledger_mode: LedgerMode::default(),
        }
    }

    /// Use a different sibling ledger when building and resolving pointers
    pub fn with_ledger_mode(mut self, mode: LedgerMode) -> Self {
        self.ledger_mode = mode;
        self
    }

    /// Fetch the manifest and open the fragment at `index`
    fn open_fragment(&self, document_id: &str, index: u64) -> Result<BufReader<ContentStream>> {
        let manifest = self.source.manifest(document_id)?;
        let entry = manifest
            .fragment(index)
            .ok_or(Error::FragmentOutOfRange {
                index,
                count: manifest.len(),
            })?;

        if !entry.is_xhtml() {
            return Err(Error::UnsupportedFragmentType(entry.media_type.clone()));
        }

        debug!(document_id, index, href = %entry.href, "Opening fragment");
        Ok(BufReader::new(self.source.fetch_fragment(document_id, entry)?))
    }

    /// Structural pointer -> packed progress.
    ///
    /// `percentage` is carried into the result unchanged; it must be digits
    /// and dots.
    pub fn to_packed(
        &self,
        document_id: &str,
        pointer_text: &str,
        percentage: &str,
    ) -> Result<PackedProgress> {
        validate_percentage(percentage)?;
        let pointer = pointer::parse(pointer_text)?;
        let fragment = pointer.fragment_index().ok_or_else(|| {
            Error::UnresolvedPointer(format!(
                "{} does not address a reading-order fragment",
                pointer_text
            ))
        })?;

        let local = match pointer {
            Pointer::Structural(path) => path.to_fragment_local().map(Pointer::Structural),
            anchor @ Pointer::Anchor(_) => Some(anchor),
        }
        .ok_or_else(|| Error::UnresolvedPointer(pointer_text.to_string()))?;

        let reader = self.open_fragment(document_id, fragment)?;
        let offset = resolve_with(&local, reader, self.ledger_mode)?;

        let packed = PackedProgress::new(fragment, offset, percentage);
        info!(document_id, pointer = pointer_text, packed = %packed, "Converted to packed progress");
        Ok(packed)
    }

    /// Packed progress -> serialized structural pointer
    pub fn to_structural(&self, document_id: &str, packed: &PackedProgress) -> Result<String> {
        let reader = self.open_fragment(document_id, packed.fragment)?;
        let local = build_pointer_at(packed.offset, reader, self.ledger_mode)?;
        let pointer = local.to_book_path(packed.fragment).to_string();

        info!(document_id, packed = %packed, pointer = %pointer, "Converted to structural pointer");
        Ok(pointer)
    }

    /// Sync service record -> packed progress, percentage taken from the record
    pub fn sync_to_packed(&self, document_id: &str, progress: &SyncProgress) -> Result<PackedProgress> {
        self.to_packed(
            document_id,
            &progress.progress,
            &percentage_text(progress.percentage),
        )
    }

    /// Packed progress -> complete sync service record for `document_key`
    pub fn packed_to_sync(
        &self,
        document_id: &str,
        document_key: &str,
        packed: &PackedProgress,
        device: &Device,
    ) -> Result<SyncProgress> {
        let percentage = packed.completion().ok_or_else(|| {
            Error::InvalidProgressFormat(format!("percentage '{}' is not a number", packed.percentage))
        })?;

        Ok(SyncProgress {
            document: document_key.to_string(),
            progress: self.to_structural(document_id, packed)?,
            percentage,
            device: device.name.clone(),
            device_id: device.id.clone(),
            timestamp: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ManifestEntry, ReadingOrderManifest, XHTML_MEDIA_TYPE};
    use std::collections::HashMap;
    use std::io::Cursor;

    const CHAPTER_ONE: &str = "<html><body><p>Call me Ishmael.</p></body></html>";
    const CHAPTER_TWO: &str = r#"<?xml version="1.0"?>
<html><head><title>II</title></head><body><div><p>Some years ago.</p><p id="pt1">Never <i>mind</i> how long.</p></div></body></html>"#;

    /// In-memory book keyed by fragment href
    struct MemorySource {
        manifest: ReadingOrderManifest,
        fragments: HashMap<String, String>,
    }

    impl MemorySource {
        fn book() -> Self {
            let mut fragments = HashMap::new();
            fragments.insert("ch1.xhtml".to_string(), CHAPTER_ONE.to_string());
            fragments.insert("ch2.xhtml".to_string(), CHAPTER_TWO.to_string());

            Self {
                manifest: ReadingOrderManifest {
                    reading_order: vec![
                        ManifestEntry::new("ch1.xhtml", XHTML_MEDIA_TYPE),
                        ManifestEntry::new("ch2.xhtml", XHTML_MEDIA_TYPE),
                        ManifestEntry::new("cover.jpg", "image/jpeg"),
                    ],
                },
                fragments,
            }
        }
    }

    impl ContentSource for MemorySource {
        fn manifest(&self, document_id: &str) -> Result<ReadingOrderManifest> {
            if document_id != "book" {
                return Err(Error::FetchFailed(format!("no book {}", document_id)));
            }
            Ok(self.manifest.clone())
        }

        fn fetch_fragment(&self, _document_id: &str, fragment: &ManifestEntry) -> Result<ContentStream> {
            let body = self
                .fragments
                .get(&fragment.href)
                .cloned()
                .ok_or_else(|| Error::FetchFailed(fragment.href.clone()))?;
            Ok(Box::new(Cursor::new(body.into_bytes())))
        }

        fn fetch_raw(&self, url: &str) -> Result<ContentStream> {
            Err(Error::FetchFailed(url.to_string()))
        }
    }

    #[test]
    fn test_to_packed_from_structural_path() {
        let source = MemorySource::book();
        let converter = Converter::new(&source);

        // "II" + "Some years ago." = 17 characters before the second <p>
        let packed = converter
            .to_packed("book", "/body/DocFragment[2]/body/div/p[2]/text().3", "39.0")
            .unwrap();
        assert_eq!(packed, PackedProgress::new(1, 20, "39.0"));
        assert_eq!(packed.to_string(), "0*1@0#20:39.0%");
    }

    #[test]
    fn test_to_packed_from_anchor() {
        let source = MemorySource::book();
        let packed = Converter::new(&source)
            .to_packed("book", "#_doc_fragment_1_ pt1", "12.5")
            .unwrap();
        assert_eq!(packed.fragment, 1);
        assert_eq!(packed.offset, 17);
    }

    #[test]
    fn test_to_structural() {
        let source = MemorySource::book();
        let packed: PackedProgress = "1725870547829*1@0#24:40.0%".parse().unwrap();
        let pointer = Converter::new(&source).to_structural("book", &packed).unwrap();
        assert_eq!(pointer, "/body/DocFragment[2]/body/div/p[2]/i/text().1");
    }

    #[test]
    fn test_packed_structural_roundtrip() {
        let source = MemorySource::book();
        let converter = Converter::new(&source);

        for offset in [0, 2, 17, 23, 30] {
            let packed = PackedProgress::new(1, offset, "50.0");
            let pointer = converter.to_structural("book", &packed).unwrap();
            let back = converter.to_packed("book", &pointer, "50.0").unwrap();
            assert_eq!(back, packed, "{}", pointer);
        }
    }

    #[test]
    fn test_sync_records() {
        let source = MemorySource::book();
        let converter = Converter::new(&source);
        let device = Device {
            name: "bridge".to_string(),
            id: "b-1".to_string(),
        };

        let packed = PackedProgress::new(0, 5, "25.0");
        let record = converter
            .packed_to_sync("book", "deadbeef", &packed, &device)
            .unwrap();
        assert_eq!(record.document, "deadbeef");
        assert_eq!(record.progress, "/body/DocFragment/body/p/text().5");
        assert!((record.percentage - 0.25).abs() < 1e-9);
        assert_eq!(record.device_id, "b-1");

        let back = converter.sync_to_packed("book", &record).unwrap();
        assert_eq!(back, packed);
    }

    #[test]
    fn test_fragment_out_of_range() {
        let source = MemorySource::book();
        let packed = PackedProgress::new(7, 0, "0.0");
        let err = Converter::new(&source).to_structural("book", &packed).unwrap_err();
        assert!(matches!(err, Error::FragmentOutOfRange { index: 7, count: 3 }));
    }

    #[test]
    fn test_unsupported_fragment_type() {
        let source = MemorySource::book();
        let err = Converter::new(&source)
            .to_packed("book", "/body/DocFragment[3]/body.0", "0.0")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFragmentType(t) if t == "image/jpeg"));
    }

    #[test]
    fn test_errors_propagate() {
        let source = MemorySource::book();
        let converter = Converter::new(&source);

        assert!(matches!(
            converter.to_packed("book", "/body/DocFragment[2]/p[x]", "0"),
            Err(Error::MalformedPointer(_))
        ));
        assert!(matches!(
            converter.to_packed("book", "/html/body/p.0", "0"),
            Err(Error::UnresolvedPointer(_))
        ));
        assert!(matches!(
            converter.to_packed("book", "/body/DocFragment[2]/body/table.0", "0"),
            Err(Error::UnresolvedPointer(_))
        ));
        assert!(matches!(
            converter.to_packed("other", "/body/DocFragment[2]/body.0", "0"),
            Err(Error::FetchFailed(_))
        ));
    }

    #[test]
    fn test_legacy_ledger_mode() {
        let source = MemorySource::book();
        let packed = PackedProgress::new(1, 30, "0.0");
        let pointer = Converter::new(&source)
            .with_ledger_mode(LedgerMode::PerDepth)
            .to_structural("book", &packed)
            .unwrap();
        assert_eq!(pointer, "/body/DocFragment[2]/body/div/p[2]/text().2");

        // Resolving in the same mode counts the newline after the declaration
        let packed = Converter::new(&source)
            .with_ledger_mode(LedgerMode::PerDepth)
            .to_packed("book", "/body/DocFragment[2]/body/div/p[2].0", "0.0")
            .unwrap();
        assert_eq!(packed.offset, 18);
    }

    #[test]
    fn test_to_packed_rejects_bad_percentage() {
        let source = MemorySource::book();
        let converter = Converter::new(&source);
        for percentage in ["abc", "", "39%", "-4"] {
            assert!(
                matches!(
                    converter.to_packed("book", "/body/DocFragment[2]/body.0", percentage),
                    Err(Error::InvalidProgressFormat(_))
                ),
                "{:?}",
                percentage
            );
        }
    }
}
