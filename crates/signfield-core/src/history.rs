//! Snapshot-based undo/redo over project state.
//!
//! History entries are full value-copies of the project, not diffs. The
//! stacks are unbounded and nothing coalesces rapid successive edits; each
//! keystroke-level nudge is its own entry. Snapshots share no storage with
//! the live project, so mutating one is never observable through the other.

use crate::field::Project;

/// Paired undo/redo stacks of project snapshots.
#[derive(Debug, Default)]
pub struct UndoRedoStack {
    undo: Vec<Project>,
    redo: Vec<Project>,
}

impl UndoRedoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture `current` before a mutation is applied.
    ///
    /// Called exactly once per user-visible mutating operation, before the
    /// mutation. Any pending redo chain is invalidated.
    pub fn before_mutation(&mut self, current: &Project) {
        self.undo.push(current.clone());
        self.redo.clear();
    }

    /// Step back once. Returns the project to restore, or `None` when
    /// there is nothing to undo (in which case redo is left untouched).
    pub fn undo(&mut self, current: &Project) -> Option<Project> {
        let previous = self.undo.pop()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    /// Step forward once; symmetric with [`UndoRedoStack::undo`].
    pub fn redo(&mut self, current: &Project) -> Option<Project> {
        let next = self.redo.pop()?;
        self.undo.push(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drop all history. Used when the project is replaced wholesale.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
