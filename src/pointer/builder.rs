//! Sibling-path builder
//!
//! Builds a structural path incrementally while a fragment is streamed. The
//! builder keeps a live stack of open elements, each rendered with its
//! occurrence among earlier same-named siblings (`p[3]`), and a per-depth
//! ledger of the names seen so far.
//!
//! Slots and ledgers are reused across pushes, so a walk over a whole
//! fragment allocates once per nesting level rather than once per element.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::{PathStep, StructuralPath};

/// How sibling occurrences are counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerMode {
    /// Sibling counts restart under every new parent; text nodes are indexed
    #[default]
    PerParent,
    /// One ledger per nesting depth, shared by unrelated parents and never
    /// reset; text nodes are always rendered as a bare `text()`, and the
    /// whitespace around the root element (after the XML declaration and
    /// doctype) counts toward offsets. Matches the selectors and offsets
    /// already stored by clients of earlier bridges.
    PerDepth,
}

impl LedgerMode {
    /// Whether text outside the root element advances the character counter
    pub fn counts_outer_text(self) -> bool {
        self == LedgerMode::PerDepth
    }
}

impl FromStr for LedgerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per-parent" | "parent" => Ok(LedgerMode::PerParent),
            "per-depth" | "depth" | "legacy" => Ok(LedgerMode::PerDepth),
            other => Err(format!("unknown sibling ledger mode '{}'", other)),
        }
    }
}

impl fmt::Display for LedgerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerMode::PerParent => write!(f, "per-parent"),
            LedgerMode::PerDepth => write!(f, "per-depth"),
        }
    }
}

/// Names (and text nodes) seen among the children at one depth
#[derive(Debug, Default)]
struct Ledger {
    seen: HashMap<String, u32>,
    texts: u32,
}

impl Ledger {
    fn bump(&mut self, name: &str) -> u32 {
        match self.seen.get_mut(name) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => {
                self.seen.insert(name.to_string(), 1);
                1
            }
        }
    }

    fn reset(&mut self) {
        self.seen.clear();
        self.texts = 0;
    }
}

/// Incremental structural path builder
#[derive(Debug)]
pub struct SiblingPathBuilder {
    mode: LedgerMode,
    /// `slots[..depth]` is the live ancestor path
    slots: Vec<PathStep>,
    /// `ledgers[d]` counts children at depth `d`
    ledgers: Vec<Ledger>,
    depth: usize,
}

impl SiblingPathBuilder {
    pub fn new(mode: LedgerMode) -> Self {
        Self {
            mode,
            slots: Vec::new(),
            ledgers: Vec::new(),
            depth: 0,
        }
    }

    /// Number of currently open elements
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Enter an element
    pub fn push(&mut self, name: &str) {
        let depth = self.depth;
        if self.ledgers.len() < depth + 2 {
            self.ledgers.resize_with(depth + 2, Ledger::default);
        }

        let occurrence = self.ledgers[depth].bump(name);
        if self.mode == LedgerMode::PerParent {
            // A new parent at this depth: its children start counting afresh
            self.ledgers[depth + 1].reset();
        }

        match self.slots.get_mut(depth) {
            Some(slot) => {
                slot.name.clear();
                slot.name.push_str(name);
                slot.occurrence = occurrence;
            }
            None => self.slots.push(PathStep::nth(name, occurrence)),
        }
        self.depth += 1;
    }

    /// Leave the innermost open element
    pub fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Record a text node under the innermost open element, returning its
    /// occurrence among the text siblings seen so far.
    pub fn text(&mut self) -> u32 {
        let depth = self.depth;
        if self.ledgers.len() <= depth {
            self.ledgers.resize_with(depth + 1, Ledger::default);
        }
        let ledger = &mut self.ledgers[depth];
        ledger.texts += 1;
        ledger.texts
    }

    /// Path of the currently open elements
    pub fn current_path(&self) -> StructuralPath {
        StructuralPath::with_steps(self.slots[..self.depth].to_vec())
    }

    /// Path to a text node under the innermost open element, `offset`
    /// characters into it
    pub fn text_path(&self, occurrence: u32, offset: u64) -> StructuralPath {
        let occurrence = match self.mode {
            LedgerMode::PerParent => occurrence,
            LedgerMode::PerDepth => 1,
        };
        let mut path = self.current_path();
        path.push(PathStep::text(occurrence));
        path.offset = offset;
        path
    }
}
