//! Native undo/redo history for the editable surface.

use super::buffer::Selection;

/// One recorded edit: `deleted` was replaced by `inserted` at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOperation {
    /// Character offset where the edit occurred.
    pub offset: usize,
    pub deleted: String,
    pub inserted: String,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

impl EditOperation {
    /// The operation that reverts this one.
    pub fn inverse(&self) -> Self {
        Self {
            offset: self.offset,
            deleted: self.inserted.clone(),
            inserted: self.deleted.clone(),
            selection_before: self.selection_after,
            selection_after: self.selection_before,
        }
    }
}

/// Undo and redo stacks, bounded to `max_size` entries.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: Vec<EditOperation>,
    redo_stack: Vec<EditOperation>,
    max_size: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EditHistory {
    pub const fn new() -> Self {
        Self::with_max_size(1000)
    }

    pub const fn with_max_size(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Record a new edit. Any redo entries are discarded.
    pub fn push(&mut self, op: EditOperation) {
        self.redo_stack.clear();
        self.undo_stack.push(op);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the edit to revert, returning its inverse ready to apply.
    pub fn undo(&mut self) -> Option<EditOperation> {
        let op = self.undo_stack.pop()?;
        let inverse = op.inverse();
        self.redo_stack.push(op);
        Some(inverse)
    }

    /// Pop the edit to re-apply.
    pub fn redo(&mut self) -> Option<EditOperation> {
        let op = self.redo_stack.pop()?;
        self.undo_stack.push(op.clone());
        Some(op)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(offset: usize, deleted: &str, inserted: &str) -> EditOperation {
        EditOperation {
            offset,
            deleted: deleted.to_string(),
            inserted: inserted.to_string(),
            selection_before: Selection::collapsed(offset),
            selection_after: Selection::collapsed(offset + inserted.chars().count()),
        }
    }

    #[test]
    fn test_undo_returns_inverse() {
        let mut history = EditHistory::new();
        history.push(op(3, "", "abc"));
        let inverse = history.undo().unwrap();
        assert_eq!(inverse.deleted, "abc");
        assert_eq!(inverse.inserted, "");
        assert_eq!(inverse.selection_after, Selection::collapsed(3));
        assert!(history.can_redo());
    }

    #[test]
    fn test_redo_returns_original() {
        let mut history = EditHistory::new();
        history.push(op(0, "x", ""));
        history.undo();
        let redo = history.redo().unwrap();
        assert_eq!(redo.deleted, "x");
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut history = EditHistory::new();
        history.push(op(0, "", "a"));
        history.undo();
        history.push(op(0, "", "b"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_size_drops_oldest() {
        let mut history = EditHistory::with_max_size(2);
        history.push(op(0, "", "a"));
        history.push(op(1, "", "b"));
        history.push(op(2, "", "c"));
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.undo().unwrap().deleted, "c");
        assert_eq!(history.undo().unwrap().deleted, "b");
        assert!(history.undo().is_none());
    }
}
