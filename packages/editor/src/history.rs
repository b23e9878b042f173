//! # Operation History
//!
//! Bounded undo/redo stacks over [`EditorOperation`]s.
//!
//! ## Design
//!
//! - Every operation carries both directions, so no inverse is computed at
//!   undo time
//! - Undo reverts the operation and moves it to the redo stack
//! - Redo reapplies it and moves it back
//! - Recording a new operation clears the redo stack
//! - Past `max_size` entries the oldest are dropped silently (0 = unlimited)

use crate::errors::EditorResult;
use crate::operations::EditorOperation;
use crate::store::DocumentStore;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct History {
    /// Applied operations (most recent last)
    undo_stack: VecDeque<EditorOperation>,

    /// Undone operations (most recent last)
    redo_stack: Vec<EditorOperation>,

    max_size: usize,
}

impl History {
    pub const DEFAULT_MAX_SIZE: usize = 100;

    pub fn new() -> Self {
        Self::with_max_size(Self::DEFAULT_MAX_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Record a freshly applied operation
    pub fn record(&mut self, operation: EditorOperation) {
        self.push_undo(operation);
        self.redo_stack.clear();
    }

    pub fn record_all(&mut self, operations: impl IntoIterator<Item = EditorOperation>) {
        for operation in operations {
            self.push_undo(operation);
        }
        self.redo_stack.clear();
    }

    /// Revert the most recent operation. `Ok(None)` when there is nothing to
    /// undo. An operation that no longer fits the document is discarded.
    pub fn undo(&mut self, store: &mut DocumentStore) -> EditorResult<Option<EditorOperation>> {
        let Some(operation) = self.undo_stack.pop_back() else {
            return Ok(None);
        };

        store.revert(&operation)?;
        self.redo_stack.push(operation.clone());
        Ok(Some(operation))
    }

    /// Reapply the most recently undone operation
    pub fn redo(&mut self, store: &mut DocumentStore) -> EditorResult<Option<EditorOperation>> {
        let Some(operation) = self.redo_stack.pop() else {
            return Ok(None);
        };

        store.apply(&operation)?;
        self.push_undo(operation.clone());
        Ok(Some(operation))
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

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Most recent operation first
    pub fn undo_entries(&self) -> impl Iterator<Item = &EditorOperation> {
        self.undo_stack.iter().rev()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_undo(&mut self, operation: EditorOperation) {
        self.undo_stack.push_back(operation);

        if self.max_size > 0 {
            while self.undo_stack.len() > self.max_size {
                self.undo_stack.pop_front();
            }
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_model::{BlockPatch, BlockType, IdGenerator, RichText};

    fn store() -> DocumentStore {
        DocumentStore::with_id_generator(IdGenerator::from_seed("t"))
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_len(), 0);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.max_size(), 100);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_and_redo_update() {
        let mut store = store();
        let mut history = History::new();

        let op = store.create(BlockType::Paragraph, None, None, "u").unwrap();
        let id = op.block_id.clone();
        history.record(op);

        let patch = BlockPatch::new()
            .set("content", RichText::plain("World"))
            .unwrap();
        history.record(store.update(&id, &patch, "u").unwrap());
        let edited = store.get(&id).unwrap().clone();

        assert!(history.undo(&mut store).unwrap().is_some());
        assert!(store.get(&id).unwrap().rich_text().unwrap().is_empty());
        assert_eq!(history.redo_len(), 1);

        assert!(history.redo(&mut store).unwrap().is_some());
        assert_eq!(store.get(&id).unwrap(), &edited);
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn test_new_operation_clears_redo() {
        let mut store = store();
        let mut history = History::new();

        history.record(store.create(BlockType::Paragraph, None, None, "u").unwrap());
        history.undo(&mut store).unwrap();
        assert_eq!(history.redo_len(), 1);

        history.record(store.create(BlockType::Todo, None, None, "u").unwrap());
        assert_eq!(history.redo_len(), 0);
        assert!(history.redo(&mut store).unwrap().is_none());
    }

    #[test]
    fn test_max_size_enforced() {
        let mut store = store();
        let mut history = History::with_max_size(2);

        for _ in 0..3 {
            history.record(store.create(BlockType::Paragraph, None, None, "u").unwrap());
        }

        assert_eq!(history.undo_len(), 2);
        history.undo(&mut store).unwrap();
        history.undo(&mut store).unwrap();
        assert!(history.undo(&mut store).unwrap().is_none());
        // the oldest block was never undoable
        assert_eq!(store.len(), 1);
    }
}
