//! Pointer types
//!
//! A pointer addresses a location inside the text content of a book. Two
//! forms are in use by the structural ecosystem:
//!
//! ```text
//! /body/DocFragment[11]/body/div/p[8]/text().56     structural path
//! #_doc_fragment_8_ pt1                             fragment anchor
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the step that matches text nodes instead of elements
pub const TEXT_STEP: &str = "text()";

/// Name of the whole-book step standing in for a fragment's root element
pub const DOC_FRAGMENT_STEP: &str = "DocFragment";

/// Marker opening a fragment anchor
pub const ANCHOR_PREFIX: &str = "#_doc_fragment_";

/// Root element of an XHTML fragment
pub const FRAGMENT_ROOT: &str = "html";

/// A location inside a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pointer {
    /// Path of named, indexed steps with a trailing character offset
    Structural(StructuralPath),
    /// Element identifier inside a reading-order fragment
    Anchor(FragmentAnchor),
}

/// A structural path (sequence of steps from the document root)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralPath {
    /// Steps from the document root; empty means the root itself
    pub steps: Vec<PathStep>,
    /// Characters into the text reachable from the final step
    pub offset: u64,
}

/// A single step in a structural path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    /// Element local name, or `text()`
    pub name: String,
    /// 1-based occurrence among same-named siblings
    pub occurrence: u32,
}

/// An element identifier inside a reading-order fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentAnchor {
    /// Reading-order fragment number
    pub fragment: u32,
    /// Value of the element's `id` attribute
    pub id: String,
}

impl Pointer {
    /// Reading-order fragment (0-based manifest position) this pointer addresses
    pub fn fragment_index(&self) -> Option<u64> {
        match self {
            Pointer::Structural(path) => path.fragment_index(),
            Pointer::Anchor(anchor) => Some(u64::from(anchor.fragment)),
        }
    }

    /// Check if this is a structural path
    pub fn is_structural(&self) -> bool {
        matches!(self, Pointer::Structural(_))
    }
}

impl StructuralPath {
    /// Create a root path
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a path with steps and a zero offset
    pub fn with_steps(steps: Vec<PathStep>) -> Self {
        Self { steps, offset: 0 }
    }

    /// Add a step to the path
    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    /// Check if this path denotes the document root
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whole-book paths start with `/body/DocFragment[n]`, where `n` is the
    /// 1-based position of the fragment in the reading order.
    pub fn fragment_index(&self) -> Option<u64> {
        match self.steps.as_slice() {
            [body, fragment, ..] if body.name == "body" && fragment.name == DOC_FRAGMENT_STEP => {
                u64::from(fragment.occurrence).checked_sub(1)
            }
            _ => None,
        }
    }

    /// Rewrite a whole-book path so it is rooted at the fragment's own root
    /// element: `/body/DocFragment[n]/body/p` becomes `/html/body/p`.
    pub fn to_fragment_local(&self) -> Option<StructuralPath> {
        self.fragment_index()?;
        let mut steps = Vec::with_capacity(self.steps.len() - 1);
        steps.push(PathStep::new(FRAGMENT_ROOT));
        steps.extend(self.steps[2..].iter().cloned());
        Some(StructuralPath {
            steps,
            offset: self.offset,
        })
    }

    /// Inverse of [`StructuralPath::to_fragment_local`]: replace the root step
    /// with `/body/DocFragment[fragment + 1]`.
    pub fn to_book_path(&self, fragment: u64) -> StructuralPath {
        let occurrence = u32::try_from(fragment.saturating_add(1)).unwrap_or(u32::MAX);
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.push(PathStep::new("body"));
        steps.push(PathStep::nth(DOC_FRAGMENT_STEP, occurrence));
        steps.extend(self.steps.iter().skip(1).cloned());
        StructuralPath {
            steps,
            offset: self.offset,
        }
    }
}

impl PathStep {
    /// Create a step matching the first occurrence
    pub fn new(name: impl Into<String>) -> Self {
        Self::nth(name, 1)
    }

    /// Create a step matching the n-th occurrence
    pub fn nth(name: impl Into<String>, occurrence: u32) -> Self {
        Self {
            name: name.into(),
            occurrence,
        }
    }

    /// Create a text node step
    pub fn text(occurrence: u32) -> Self {
        Self::nth(TEXT_STEP, occurrence)
    }

    /// Check if this step matches text nodes
    pub fn is_text(&self) -> bool {
        self.name == TEXT_STEP
    }
}

impl FragmentAnchor {
    pub fn new(fragment: u32, id: impl Into<String>) -> Self {
        Self {
            fragment,
            id: id.into(),
        }
    }
}

impl From<StructuralPath> for Pointer {
    fn from(path: StructuralPath) -> Self {
        Pointer::Structural(path)
    }
}

impl From<FragmentAnchor> for Pointer {
    fn from(anchor: FragmentAnchor) -> Self {
        Pointer::Anchor(anchor)
    }
}

// Display implementations for serialization

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pointer::Structural(path) => write!(f, "{}", path),
            Pointer::Anchor(anchor) => write!(f, "{}", anchor),
        }
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        write!(f, ".{}", self.offset)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name)?;
        if self.occurrence > 1 {
            write!(f, "[{}]", self.occurrence)?;
        }
        Ok(())
    }
}

impl fmt::Display for FragmentAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_ {}", ANCHOR_PREFIX, self.fragment, self.id)
    }
}
