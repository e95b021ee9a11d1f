//! Progress Bridge
//!
//! Translates reading progress between e-reader ecosystems that address
//! positions differently: a packed numeric form (fragment index plus
//! character offset) and structural pointers into the book's XHTML. Also
//! computes the sampled content hash used as a document's sync identity.

pub mod config;
pub mod content;
pub mod convert;
pub mod error;
pub mod identity;
pub mod pointer;
pub mod progress;
pub mod sync;

pub use convert::Converter;
pub use error::{Error, Result};
pub use progress::PackedProgress;
