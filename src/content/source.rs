//! Content source trait
//!
//! The collaborator serving book content: reading-order manifests, XHTML
//! fragments and raw file downloads.

use std::io::Read;

use super::types::{ManifestEntry, ReadingOrderManifest};
use crate::error::Result;

/// A byte stream handed out by a content source
pub type ContentStream = Box<dyn Read + Send>;

/// Content source trait
///
/// Implementations own timeouts and cancellation; failures surface as
/// `Error::FetchFailed` or `Error::DocumentRead` and are never retried here.
pub trait ContentSource: Send + Sync {
    /// Fetch the reading-order manifest of a book
    fn manifest(&self, document_id: &str) -> Result<ReadingOrderManifest>;

    /// Open a reading-order fragment of a book
    fn fetch_fragment(&self, document_id: &str, fragment: &ManifestEntry) -> Result<ContentStream>;

    /// Open a raw download by URL
    fn fetch_raw(&self, url: &str) -> Result<ContentStream>;
}
