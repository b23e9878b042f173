//! # Selection
//!
//! The caret or range the local user is editing. Selection is ephemeral: it
//! is never recorded in history and never exported.

use playbook_model::BlockId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSelection {
    pub block_id: BlockId,
    pub offset: usize,
    pub length: usize,
    pub is_collapsed: bool,
}

impl EditorSelection {
    pub fn caret(block_id: BlockId, offset: usize) -> Self {
        Self::range(block_id, offset, 0)
    }

    pub fn range(block_id: BlockId, offset: usize, length: usize) -> Self {
        Self {
            block_id,
            offset,
            length,
            is_collapsed: length == 0,
        }
    }
}

/// Current selection plus the rules for keeping it valid
#[derive(Debug, Default)]
pub struct SelectionState {
    current: Option<EditorSelection>,
}

impl SelectionState {
    pub fn get(&self) -> Option<&EditorSelection> {
        self.current.as_ref()
    }

    pub fn set(&mut self, selection: EditorSelection) {
        self.current = Some(selection);
    }

    /// Returns true if there was a selection to clear
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Clear the selection if it points at `block_id`
    pub fn clear_if_on(&mut self, block_id: &BlockId) -> bool {
        match &self.current {
            Some(selection) if &selection.block_id == block_id => self.clear(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_collapse_flag() {
        assert!(EditorSelection::caret(BlockId::new("a"), 3).is_collapsed);
        assert!(!EditorSelection::range(BlockId::new("a"), 3, 2).is_collapsed);
    }

    #[test]
    fn test_clear_if_on() {
        let mut state = SelectionState::default();
        state.set(EditorSelection::caret(BlockId::new("a"), 0));

        assert!(!state.clear_if_on(&BlockId::new("b")));
        assert!(state.get().is_some());
        assert!(state.clear_if_on(&BlockId::new("a")));
        assert!(state.get().is_none());
        assert!(!state.clear());
    }
}
