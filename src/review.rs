//! Tracked changes: change groups and their resolution.
//!
//! ## The Model
//!
//! An `(original, edited)` pair diffs into an ordered node sequence:
//!
//! ```text
//! [Unchanged "He walked to the"]
//! [Change #0: "store" -> "market"]
//! [Unchanged "and bought"]
//! [Change #1: "" -> "fresh"]
//! [Unchanged "bread."]
//! ```
//!
//! Each change group is a maximal run of consecutive word insertions and
//! deletions, reviewed as one unit. Groups resolve independently:
//!
//! ```text
//!            accept
//!           ┌───────> Accepted (resolved = edited fragment)
//! Pending ──┤
//!           └───────> Rejected (resolved = original fragment)
//!            reject
//! ```
//!
//! Both transitions are terminal. Repeating the same resolution is an
//! idempotent no-op; the opposite resolution is an error — changing your
//! mind means discarding the document and re-diffing.
//!
//! ## Optimistic Default
//!
//! Extracting text treats pending groups as already applied (their edited
//! fragment shows). The edit is what the user asked for; rejection is the
//! explicit action.

use crate::diff::{append_fragment, diff_words, DiffPart};
use crate::error::{Error, Result};

/// Resolution state of a change group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    /// Not yet reviewed.
    Pending,
    /// Accepted: the edited fragment stands.
    Accepted,
    /// Rejected: the original fragment stands.
    Rejected,
}

/// A maximal run of consecutive insertions/deletions, resolved as a unit.
///
/// An empty `original` is a pure insertion, an empty `edited` a pure
/// deletion, both non-empty a replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeGroup {
    id: usize,
    original: String,
    edited: String,
    state: ChangeState,
    resolved: Option<String>,
}

impl ChangeGroup {
    fn new(id: usize, original: String, edited: String) -> Self {
        Self {
            id,
            original,
            edited,
            state: ChangeState::Pending,
            resolved: None,
        }
    }

    /// Stable identifier of this group within its document.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The fragment this group removes from the original.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The fragment this group adds in the edited version.
    #[must_use]
    pub fn edited(&self) -> &str {
        &self.edited
    }

    /// Current resolution state.
    #[must_use]
    pub fn state(&self) -> ChangeState {
        self.state
    }

    /// The resolved fragment, set iff the group is no longer pending.
    #[must_use]
    pub fn resolved(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    /// Whether this group only inserts text.
    #[must_use]
    pub fn is_insertion(&self) -> bool {
        self.original.is_empty() && !self.edited.is_empty()
    }

    /// Whether this group only deletes text.
    #[must_use]
    pub fn is_deletion(&self) -> bool {
        !self.original.is_empty() && self.edited.is_empty()
    }

    fn resolve(&mut self, to: ChangeState) -> Result<()> {
        if self.state == to {
            return Ok(()); // idempotent re-resolution
        }
        if self.state != ChangeState::Pending {
            return Err(Error::GroupResolved { id: self.id });
        }
        self.resolved = Some(match to {
            ChangeState::Accepted => self.edited.clone(),
            ChangeState::Rejected => self.original.clone(),
            ChangeState::Pending => unreachable!("resolve target is terminal"),
        });
        self.state = to;
        Ok(())
    }

    /// The fragment this group currently contributes to display text:
    /// the resolution if resolved, the edited fragment (optimistic
    /// default) while pending.
    #[must_use]
    pub fn display_fragment(&self) -> &str {
        self.resolved.as_deref().unwrap_or(&self.edited)
    }
}

/// One element of a review document: literal text or a change group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewNode {
    /// Text identical in both versions.
    Unchanged(String),
    /// An accept/reject-able change.
    Change(ChangeGroup),
}

/// Tally of group states in a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewStats {
    /// Groups not yet resolved.
    pub pending: usize,
    /// Groups accepted.
    pub accepted: usize,
    /// Groups rejected.
    pub rejected: usize,
}

/// An ordered sequence of unchanged text and change groups, built once
/// per `(original, edited)` pair and resolved in place.
///
/// ## Example
///
/// ```rust
/// use stet::ReviewDocument;
///
/// let mut doc = ReviewDocument::new("Hello world.", "Hello there.");
/// assert_eq!(doc.stats().pending, 1);
///
/// doc.reject(0).unwrap();
/// assert_eq!(doc.clean_text(), "Hello world.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDocument {
    nodes: Vec<ReviewNode>,
}

impl ReviewDocument {
    /// Diff an `(original, edited)` pair into a review document.
    #[must_use]
    pub fn new(original: &str, edited: &str) -> Self {
        Self::from_parts(diff_words(original, edited))
    }

    /// Build a document from a precomputed diff.
    ///
    /// Consecutive added/removed parts coalesce into one group; runs of
    /// unchanged parts become text nodes and never join a group.
    #[must_use]
    pub fn from_parts(parts: Vec<DiffPart>) -> Self {
        let mut nodes = Vec::new();
        let mut unchanged = String::new();
        let mut removed = String::new();
        let mut added = String::new();
        let mut in_group = false;
        let mut next_id = 0usize;

        let mut flush_group = |nodes: &mut Vec<ReviewNode>,
                               removed: &mut String,
                               added: &mut String,
                               in_group: &mut bool,
                               next_id: &mut usize| {
            if *in_group {
                nodes.push(ReviewNode::Change(ChangeGroup::new(
                    *next_id,
                    std::mem::take(removed),
                    std::mem::take(added),
                )));
                *next_id += 1;
                *in_group = false;
            }
        };

        for part in parts {
            match part {
                DiffPart::Unchanged(v) => {
                    flush_group(&mut nodes, &mut removed, &mut added, &mut in_group, &mut next_id);
                    append_fragment(&mut unchanged, &v);
                }
                DiffPart::Removed(v) => {
                    if !unchanged.is_empty() {
                        nodes.push(ReviewNode::Unchanged(std::mem::take(&mut unchanged)));
                    }
                    append_fragment(&mut removed, &v);
                    in_group = true;
                }
                DiffPart::Added(v) => {
                    if !unchanged.is_empty() {
                        nodes.push(ReviewNode::Unchanged(std::mem::take(&mut unchanged)));
                    }
                    append_fragment(&mut added, &v);
                    in_group = true;
                }
            }
        }
        flush_group(&mut nodes, &mut removed, &mut added, &mut in_group, &mut next_id);
        if !unchanged.is_empty() {
            nodes.push(ReviewNode::Unchanged(unchanged));
        }

        Self { nodes }
    }

    /// The node sequence, in document order.
    #[must_use]
    pub fn nodes(&self) -> &[ReviewNode] {
        &self.nodes
    }

    /// Iterate the change groups in document order.
    pub fn groups(&self) -> impl Iterator<Item = &ChangeGroup> {
        self.nodes.iter().filter_map(|n| match n {
            ReviewNode::Change(g) => Some(g),
            ReviewNode::Unchanged(_) => None,
        })
    }

    fn group_mut(&mut self, id: usize) -> Option<&mut ChangeGroup> {
        self.nodes.iter_mut().find_map(|n| match n {
            ReviewNode::Change(g) if g.id == id => Some(g),
            _ => None,
        })
    }

    /// Accept the group with the given id.
    ///
    /// Idempotent on an already-accepted group.
    ///
    /// # Errors
    ///
    /// [`Error::GroupResolved`] if the group was rejected, or if no group
    /// has this id.
    pub fn accept(&mut self, id: usize) -> Result<()> {
        self.group_mut(id)
            .ok_or(Error::GroupResolved { id })?
            .resolve(ChangeState::Accepted)
    }

    /// Reject the group with the given id.
    ///
    /// Idempotent on an already-rejected group.
    ///
    /// # Errors
    ///
    /// [`Error::GroupResolved`] if the group was accepted, or if no group
    /// has this id.
    pub fn reject(&mut self, id: usize) -> Result<()> {
        self.group_mut(id)
            .ok_or(Error::GroupResolved { id })?
            .resolve(ChangeState::Rejected)
    }

    /// Accept every pending group.
    pub fn accept_all(&mut self) {
        self.resolve_all(ChangeState::Accepted);
    }

    /// Reject every pending group.
    pub fn reject_all(&mut self) {
        self.resolve_all(ChangeState::Rejected);
    }

    fn resolve_all(&mut self, to: ChangeState) {
        for node in &mut self.nodes {
            if let ReviewNode::Change(g) = node {
                if g.state == ChangeState::Pending {
                    // Pending -> terminal cannot fail.
                    let _ = g.resolve(to);
                }
            }
        }
    }

    /// Whether every group has been resolved.
    #[must_use]
    pub fn is_fully_resolved(&self) -> bool {
        self.groups().all(|g| g.state != ChangeState::Pending)
    }

    /// Tally group states.
    #[must_use]
    pub fn stats(&self) -> ReviewStats {
        let mut stats = ReviewStats::default();
        for g in self.groups() {
            match g.state {
                ChangeState::Pending => stats.pending += 1,
                ChangeState::Accepted => stats.accepted += 1,
                ChangeState::Rejected => stats.rejected += 1,
            }
        }
        stats
    }

    /// Extract the current text: unchanged nodes verbatim, each group's
    /// resolution (or its edited fragment while pending).
    #[must_use]
    pub fn clean_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                ReviewNode::Unchanged(text) => append_fragment(&mut out, text),
                ReviewNode::Change(g) => append_fragment(&mut out, g.display_fragment()),
            }
        }
        out
    }
}
