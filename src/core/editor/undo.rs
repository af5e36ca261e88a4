//! Diff-based undo history.
//!
//! Every buffer edit is recorded as a [`BufferDiff`] (a line splice with the
//! lines it replaced), so undo applies the inverse and redo applies the diff
//! again. Diffs from one user action are grouped into a [`VimChange`].

use std::collections::VecDeque;

use super::buffer::{Position, TextBuffer};
use crate::utils::clock::now_ms;

/// Lines `[line, line + old.len())` were replaced by `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDiff {
    pub line: usize,
    pub old: Vec<String>,
    pub new: Vec<String>,
}

impl BufferDiff {
    pub fn new(line: usize, old: Vec<String>, new: Vec<String>) -> Self {
        Self { line, old, new }
    }

    pub fn apply(&self, buffer: &mut TextBuffer) {
        buffer.splice(self.line, self.old.len(), &self.new);
    }

    pub fn inverse(&self) -> Self {
        Self {
            line: self.line,
            old: self.new.clone(),
            new: self.old.clone(),
        }
    }

    /// Fold `next` into this diff when it rewrites exactly what this one
    /// produced. Keeps a run of keystrokes on one line as a single diff.
    fn absorb(&mut self, next: &BufferDiff) -> bool {
        if next.line == self.line && next.old == self.new {
            self.new = next.new.clone();
            true
        } else {
            false
        }
    }
}

/// One undoable user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VimChange {
    id: u64,
    pub diffs: Vec<BufferDiff>,
    pub cursor_before: Position,
    pub cursor_after: Position,
    /// Unix milliseconds when the change started.
    pub timestamp: u64,
}

impl VimChange {
    pub fn new(cursor: Position) -> Self {
        Self {
            id: 0,
            diffs: Vec::new(),
            cursor_before: cursor,
            cursor_after: cursor,
            timestamp: now_ms(),
        }
    }

    pub fn push(&mut self, diff: BufferDiff) {
        let merged = self
            .diffs
            .last_mut()
            .is_some_and(|last| last.absorb(&diff));
        if !merged {
            self.diffs.push(diff);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn apply(&self, buffer: &mut TextBuffer) {
        for diff in &self.diffs {
            diff.apply(buffer);
        }
    }

    pub fn revert(&self, buffer: &mut TextBuffer) {
        for diff in self.diffs.iter().rev() {
            diff.inverse().apply(buffer);
        }
    }
}

/// Linear undo/redo stacks with a saved-state marker.
#[derive(Debug)]
pub struct UndoHistory {
    undo: VecDeque<VimChange>,
    redo: Vec<VimChange>,
    limit: usize,
    next_id: u64,
    /// Id of the newest change evicted by the limit: the state the buffer
    /// returns to once every remaining change is undone.
    base: Option<u64>,
    /// State that matches the file on disk.
    saved: Option<u64>,
}

impl UndoHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
            next_id: 1,
            base: None,
            saved: None,
        }
    }

    /// Record a change and drop everything that could have been redone.
    pub fn push(&mut self, mut change: VimChange) {
        if change.is_empty() {
            return;
        }
        change.id = self.next_id;
        self.next_id += 1;
        self.redo.clear();
        self.undo.push_back(change);
        while self.undo.len() > self.limit {
            if let Some(evicted) = self.undo.pop_front() {
                self.base = Some(evicted.id);
            }
        }
    }

    /// Move the newest change to the redo stack and return it for reverting.
    pub fn undo(&mut self) -> Option<&VimChange> {
        let change = self.undo.pop_back()?;
        self.redo.push(change);
        self.redo.last()
    }

    /// Move the newest undone change back and return it for re-applying.
    pub fn redo(&mut self) -> Option<&VimChange> {
        let change = self.redo.pop()?;
        self.undo.push_back(change);
        self.undo.back()
    }

    fn current(&self) -> Option<u64> {
        self.undo.back().map(|change| change.id).or(self.base)
    }

    pub fn mark_saved(&mut self) {
        self.saved = self.current();
    }

    pub fn is_modified(&self) -> bool {
        self.current() != self.saved
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
