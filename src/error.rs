//! Error types for the Progress Bridge

use thiserror::Error;

use crate::pointer::PointerParseError;
use crate::sync::SyncError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Conversion error type
///
/// Every variant is terminal for the call that produced it; nothing in the
/// core retries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed pointer: {0}")]
    MalformedPointer(#[from] PointerParseError),

    #[error("Unresolved pointer: {0}")]
    UnresolvedPointer(String),

    #[error("Invalid progress format: {0}")]
    InvalidProgressFormat(String),

    #[error("Unsupported fragment type: {0}")]
    UnsupportedFragmentType(String),

    #[error("Fragment {index} not in book range ({count} fragments)")]
    FragmentOutOfRange { index: u64, count: usize },

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Document read error: {0}")]
    DocumentRead(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    XmlParse(quick_xml::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            // A failing fragment stream is a read error, not bad markup
            quick_xml::Error::Io(io) => {
                Error::DocumentRead(std::io::Error::new(io.kind(), io.to_string()))
            }
            other => Error::XmlParse(other),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::FetchFailed(err.to_string())
    }
}

impl Error {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MalformedPointer(_) => "malformed_pointer",
            Error::UnresolvedPointer(_) => "unresolved_pointer",
            Error::InvalidProgressFormat(_) => "invalid_progress_format",
            Error::UnsupportedFragmentType(_) => "unsupported_fragment_type",
            Error::FragmentOutOfRange { .. } => "fragment_out_of_range",
            Error::FetchFailed(_) => "fetch_failed",
            Error::DocumentRead(_) => "document_read_error",
            Error::XmlParse(_) => "parse_error",
            Error::Sync(_) => "sync_error",
        }
    }
}
