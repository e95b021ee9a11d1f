//! Pointer module
//!
//! Parsing, building and resolution of pointers into the text content of
//! XHTML fragments.
//!
//! # Overview
//!
//! A pointer is either a structural path of named, indexed element steps
//! ending in a character offset, or a fragment anchor naming an element by
//! its `id`. Positions are absolute character offsets over the fragment's
//! text laid end to end.
//!
//! ```text
//! /body/DocFragment[11]/body/div/p[8]/text().56
//!  │    │               │    │   │    │      └── 56 characters into the text
//!  │    │               │    │   │    └───────── first text node
//!  │    │               │    │   └────────────── 8th <p> among its siblings
//!  │    │               │    └────────────────── first <div>
//!  │    │               └─────────────────────── fragment's own <body>
//!  │    └─────────────────────────────────────── 11th reading-order fragment
//!  └──────────────────────────────────────────── whole-book root
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use crate::pointer::{build_pointer_at, parse, LedgerMode};
//!
//! let pointer = parse("/html/body/p[2]/text().12")?;
//! let offset = pointer.resolve(fragment)?;
//!
//! let path = build_pointer_at(offset, other_fragment, LedgerMode::PerParent)?;
//! ```

mod builder;
mod parser;
mod resolver;
mod stream;
mod types;

// Re-export main types
pub use types::{
    FragmentAnchor, PathStep, Pointer, StructuralPath, ANCHOR_PREFIX, DOC_FRAGMENT_STEP,
    FRAGMENT_ROOT, TEXT_STEP,
};

// Re-export parser functions
pub use parser::{parse, parse_anchor, parse_path, PointerParseError};

// Re-export builder
pub use builder::{LedgerMode, SiblingPathBuilder};

// Re-export resolver
pub use resolver::{
    build_pointer_at, resolve, resolve_anchor, resolve_path, resolve_with, MatchState,
    PathMatcher,
};

pub use stream::char_count;
