//! Content module
//!
//! Access to book content: reading-order manifests, XHTML fragments and raw
//! downloads used for document identity.

mod komga;
mod source;
mod types;

pub use komga::KomgaClient;
pub use source::{ContentSource, ContentStream};
pub use types::{ManifestEntry, ReadingOrderManifest, XHTML_MEDIA_TYPE};
