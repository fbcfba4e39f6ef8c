//! Undo/redo version log for editor state.
//!
//! An explicit append-only log with a movable cursor: `past` snapshots
//! behind the cursor, one `present` value, and `future` snapshots ahead
//! of it (populated by undo, consumed by redo). Pushing a new snapshot
//! discards the redo branch, the conventional linear-history rule.
//!
//! Kept fully separate from the retrieval engine: edit history never
//! influences search freshness.

/// Snapshot history with undo/redo cursor movement.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: Vec<T>,
    present: T,
    future: Vec<T>,
}

impl<T: Clone> History<T> {
    pub fn new(initial: T) -> Self {
        Self {
            past: Vec::new(),
            present: initial,
            future: Vec::new(),
        }
    }

    /// The value at the cursor.
    pub fn present(&self) -> &T {
        &self.present
    }

    /// Record a new snapshot, discarding any redo branch.
    pub fn push(&mut self, state: T) {
        let prev = std::mem::replace(&mut self.present, state);
        self.past.push(prev);
        self.future.clear();
    }

    /// Move the cursor back one snapshot. Returns false at the start.
    pub fn undo(&mut self) -> bool {
        match self.past.pop() {
            Some(prev) => {
                let cur = std::mem::replace(&mut self.present, prev);
                self.future.push(cur);
                true
            }
            None => false,
        }
    }

    /// Move the cursor forward one snapshot. Returns false at the end.
    pub fn redo(&mut self) -> bool {
        match self.future.pop() {
            Some(next) => {
                let cur = std::mem::replace(&mut self.present, next);
                self.past.push(cur);
                true
            }
            None => false,
        }
    }

    /// Drop all history and start over from `state` (e.g. after loading
    /// a project from disk).
    pub fn reset(&mut self, state: T) {
        self.past.clear();
        self.future.clear();
        self.present = state;
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}
