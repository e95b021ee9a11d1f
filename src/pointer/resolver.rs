//! Position Resolver
//!
//! Two inverse streaming operations over one XHTML fragment:
//!
//! - [`resolve`]: pointer -> absolute character offset
//! - [`build_pointer_at`]: absolute character offset -> structural path
//!
//! Both address the fragment as all of its text content laid end to end: a
//! single counter grows in document order across the whole walk and never
//! resets when entering or leaving an element.

use std::io::BufRead;
use std::ops::ControlFlow;

use tracing::debug;

use super::builder::{LedgerMode, SiblingPathBuilder};
use super::stream::{exhausted, walk, Node};
use super::types::{FragmentAnchor, Pointer, StructuralPath};
use crate::error::{Error, Result};

/// Outcome of feeding one node to a [`PathMatcher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// Keep streaming
    Pending,
    /// Target located at this absolute character offset
    Found(u64),
    /// An element on the matched path closed before the target was seen
    Lost,
    /// Target located, but its trailing offset runs past `u64::MAX`
    Overflow,
}

/// Streaming matcher for a structural path.
///
/// Keeps a cursor into the steps, the remaining occurrences wanted at every
/// step, and a pruning depth for subtrees that are not on the path. Text in a
/// pruned subtree still advances the character counter.
#[derive(Debug)]
pub struct PathMatcher<'p> {
    path: &'p StructuralPath,
    remaining: Vec<u32>,
    depth: usize,
    prune: usize,
    counter: u64,
}

impl<'p> PathMatcher<'p> {
    pub fn new(path: &'p StructuralPath) -> Self {
        Self {
            path,
            remaining: path.steps.iter().map(|step| step.occurrence).collect(),
            depth: 0,
            prune: 0,
            counter: 0,
        }
    }

    /// Characters seen so far
    pub fn position(&self) -> u64 {
        self.counter
    }

    /// Number of steps satisfied so far
    pub fn matched(&self) -> usize {
        self.depth
    }

    pub fn open(&mut self, name: &str) -> MatchState {
        if self.prune > 0 {
            self.prune += 1;
            return MatchState::Pending;
        }

        let Some(step) = self.path.steps.get(self.depth) else {
            self.prune = 1;
            return MatchState::Pending;
        };

        if !step.is_text() && step.name == name {
            // An occurrence of 0 is treated as the first one
            self.remaining[self.depth] = self.remaining[self.depth].saturating_sub(1);
            if self.remaining[self.depth] == 0 {
                self.depth += 1;
                if self.depth == self.path.steps.len() {
                    return self.found(self.counter);
                }
                return MatchState::Pending;
            }
        }

        // Not on the path (or an earlier same-named sibling)
        self.prune = 1;
        MatchState::Pending
    }

    pub fn close(&mut self) -> MatchState {
        if self.prune > 0 {
            self.prune -= 1;
            return MatchState::Pending;
        }
        MatchState::Lost
    }

    pub fn text(&mut self, chars: u64) -> MatchState {
        let start = self.counter;
        self.counter = self.counter.saturating_add(chars);

        if self.prune > 0 {
            return MatchState::Pending;
        }
        match self.path.steps.get(self.depth) {
            Some(step) if step.is_text() => {
                self.remaining[self.depth] = self.remaining[self.depth].saturating_sub(1);
                if self.remaining[self.depth] > 0 {
                    return MatchState::Pending;
                }
                self.depth += 1;
                if self.depth == self.path.steps.len() {
                    self.found(start)
                } else {
                    // Nothing can be nested inside a text node
                    MatchState::Lost
                }
            }
            _ => MatchState::Pending,
        }
    }

    fn found(&self, base: u64) -> MatchState {
        match base.checked_add(self.path.offset) {
            Some(offset) => MatchState::Found(offset),
            None => MatchState::Overflow,
        }
    }
}

/// Resolve a pointer against a fragment to an absolute character offset
pub fn resolve<R: BufRead>(pointer: &Pointer, source: R) -> Result<u64> {
    resolve_with(pointer, source, LedgerMode::default())
}

/// Resolve a pointer, counting characters the way `mode` builds pointers
pub fn resolve_with<R: BufRead>(pointer: &Pointer, source: R, mode: LedgerMode) -> Result<u64> {
    let outer_text = mode.counts_outer_text();
    match pointer {
        Pointer::Structural(path) => match_path(path, source, outer_text),
        Pointer::Anchor(anchor) => match_anchor(anchor, source, outer_text),
    }
}

/// Resolve a fragment-local structural path
pub fn resolve_path<R: BufRead>(path: &StructuralPath, source: R) -> Result<u64> {
    match_path(path, source, false)
}

/// Resolve an anchor to the offset of the first element carrying its id
pub fn resolve_anchor<R: BufRead>(anchor: &FragmentAnchor, source: R) -> Result<u64> {
    match_anchor(anchor, source, false)
}

fn match_path<R: BufRead>(path: &StructuralPath, source: R, outer_text: bool) -> Result<u64> {
    if path.is_root() {
        return Ok(path.offset);
    }

    let mut matcher = PathMatcher::new(path);
    let found = walk(source, outer_text, |node| {
        let state = match node {
            Node::Open(element) => matcher.open(element.name),
            Node::Close => matcher.close(),
            Node::Text(chars) => matcher.text(chars),
        };
        match state {
            MatchState::Pending => Ok(ControlFlow::Continue(())),
            MatchState::Found(offset) => Ok(ControlFlow::Break(Some(offset))),
            MatchState::Lost => Ok(ControlFlow::Break(None)),
            MatchState::Overflow => Err(Error::UnresolvedPointer(format!(
                "{} lies beyond the addressable range",
                path
            ))),
        }
    })?;

    match found.flatten() {
        Some(offset) => {
            debug!(pointer = %path, offset, "Resolved structural path");
            Ok(offset)
        }
        None => {
            debug!(
                pointer = %path,
                matched = matcher.matched(),
                scanned = matcher.position(),
                "Structural path did not resolve"
            );
            Err(exhausted(path))
        }
    }
}

fn match_anchor<R: BufRead>(anchor: &FragmentAnchor, source: R, outer_text: bool) -> Result<u64> {
    let mut counter = 0u64;
    let found = walk(source, outer_text, |node| {
        match node {
            Node::Open(element) => {
                if element.has_id(&anchor.id)? {
                    return Ok(ControlFlow::Break(counter));
                }
            }
            Node::Text(chars) => counter = counter.saturating_add(chars),
            Node::Close => {}
        }
        Ok(ControlFlow::Continue(()))
    })?;

    let offset = found.ok_or_else(|| exhausted(anchor))?;
    debug!(pointer = %anchor, offset, "Resolved fragment anchor");
    Ok(offset)
}

/// Build the structural path denoting a character offset in a fragment.
///
/// The path ends in a `text()` step naming the text node the offset falls
/// in, with the remainder as its trailing offset. An offset landing exactly
/// on a boundary belongs to the earlier text node. Under
/// [`LedgerMode::PerDepth`] the whitespace around the root element counts as
/// text too.
pub fn build_pointer_at<R: BufRead>(
    offset: u64,
    source: R,
    mode: LedgerMode,
) -> Result<StructuralPath> {
    let mut builder = SiblingPathBuilder::new(mode);
    let mut remaining = offset;

    let found = walk(source, mode.counts_outer_text(), |node| {
        match node {
            Node::Open(element) => builder.push(element.name),
            Node::Close => builder.pop(),
            Node::Text(chars) => {
                let occurrence = builder.text();
                if chars < remaining {
                    remaining -= chars;
                } else {
                    return Ok(ControlFlow::Break(builder.text_path(occurrence, remaining)));
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    })?;

    let path = found.ok_or_else(|| {
        Error::UnresolvedPointer(format!(
            "character offset {} is beyond the end of the fragment",
            offset
        ))
    })?;
    debug!(offset, pointer = %path, %mode, "Built pointer at offset");
    Ok(path)
}

impl Pointer {
    /// Resolve this pointer against a fragment
    pub fn resolve<R: BufRead>(&self, source: R) -> Result<u64> {
        resolve(self, source)
    }
}
