//! Pointer Parser
//!
//! Parses pointer strings into structured [`Pointer`] values.
//!
//! Grammar:
//! ```text
//! pointer   = anchor | path
//! anchor    = "#_doc_fragment_" number "_" ws+ token ws*
//! path      = { "/" } [ segment { "/" { "/" } segment } ] { "/" }
//! segment   = name [ "[" number "]" ] [ "." number ]
//! name      = word | "text()"
//! ```
//!
//! Only the last segment may carry a character offset.

use std::str::FromStr;

use thiserror::Error;

use super::types::*;

/// Pointer parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerParseError {
    #[error("Invalid fragment anchor '{0}'")]
    InvalidAnchor(String),

    #[error("Invalid fragment number in anchor '{0}'")]
    InvalidFragment(String),

    #[error("Invalid path segment '{segment}' in '{input}'")]
    InvalidSegment { input: String, segment: String },

    #[error("Sibling count must be at least 1 in segment '{0}'")]
    ZeroCount(String),

    #[error("Character offset in the middle of path '{0}'")]
    MisplacedOffset(String),
}

/// Parse a pointer string
pub fn parse(input: &str) -> Result<Pointer, PointerParseError> {
    if input.starts_with('#') {
        return parse_anchor(input).map(Pointer::Anchor);
    }

    parse_path(input).map(Pointer::Structural)
}

/// Parse the `#_doc_fragment_<n>_ <id>` form
pub fn parse_anchor(input: &str) -> Result<FragmentAnchor, PointerParseError> {
    let invalid = || PointerParseError::InvalidAnchor(input.to_string());

    let body = input.strip_prefix(ANCHOR_PREFIX).ok_or_else(invalid)?;
    let digits_end = body
        .find(|ch: char| !ch.is_ascii_digit())
        .ok_or_else(invalid)?;
    if digits_end == 0 {
        return Err(invalid());
    }

    let (digits, rest) = body.split_at(digits_end);
    let rest = rest.strip_prefix('_').ok_or_else(invalid)?;
    if !rest.starts_with(char::is_whitespace) {
        return Err(invalid());
    }

    let mut tokens = rest.split_whitespace();
    let id = tokens.next().ok_or_else(invalid)?;
    if tokens.next().is_some() {
        return Err(invalid());
    }

    let fragment = digits
        .parse()
        .map_err(|_| PointerParseError::InvalidFragment(input.to_string()))?;

    Ok(FragmentAnchor::new(fragment, id))
}

/// Parse a `/`-separated structural path
pub fn parse_path(input: &str) -> Result<StructuralPath, PointerParseError> {
    let segments: Vec<&str> = input.split('/').filter(|s| !s.is_empty()).collect();
    let mut path = StructuralPath::new();

    for (i, segment) in segments.iter().enumerate() {
        let (step, offset) = parse_segment(segment).ok_or_else(|| {
            PointerParseError::InvalidSegment {
                input: input.to_string(),
                segment: segment.to_string(),
            }
        })?;

        if step.occurrence == 0 {
            return Err(PointerParseError::ZeroCount(segment.to_string()));
        }

        if let Some(offset) = offset {
            if i + 1 != segments.len() {
                return Err(PointerParseError::MisplacedOffset(input.to_string()));
            }
            path.offset = offset;
        }

        path.push(step);
    }

    Ok(path)
}

/// Parse `name[count].offset`, returning `None` on any grammar mismatch
fn parse_segment(segment: &str) -> Option<(PathStep, Option<u64>)> {
    let (name, mut rest) = match segment.strip_prefix(TEXT_STEP) {
        Some(rest) => (TEXT_STEP, rest),
        None => {
            let end = segment
                .find(|ch: char| !is_word_char(ch))
                .unwrap_or(segment.len());
            if end == 0 {
                return None;
            }
            segment.split_at(end)
        }
    };

    let mut occurrence = 1;
    if let Some(bracketed) = rest.strip_prefix('[') {
        let (count, after) = bracketed.split_once(']')?;
        occurrence = parse_number(count)?;
        rest = after;
    }

    let offset = match rest.strip_prefix('.') {
        Some(digits) => Some(parse_number(digits)?),
        None if rest.is_empty() => None,
        None => return None,
    };

    Some((PathStep::nth(name, occurrence), offset))
}

fn parse_number<T: FromStr>(digits: &str) -> Option<T> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

impl FromStr for Pointer {
    type Err = PointerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl FromStr for StructuralPath {
    type Err = PointerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}
