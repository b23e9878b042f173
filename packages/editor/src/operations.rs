//! # Editor Operations
//!
//! Every document mutation is recorded as an [`EditorOperation`] carrying
//! enough data to apply it again and to reverse it.
//!
//! ## Operation Semantics
//!
//! ### Insert
//! - Full block snapshot plus its index in the parent's children
//! - Reverse removes the block and detaches it from its parent
//!
//! ### Delete
//! - Full block snapshot taken after its children were deleted, so the
//!   snapshot always has an empty child list
//! - Reverse re-inserts it at the recorded index
//!
//! ### Update
//! - `before` / `after` partial states over exactly the fields that changed,
//!   edit stamp included
//!
//! ### Move
//! - Old and new placement plus both edit stamps

use chrono::{DateTime, Utc};
use playbook_model::{Block, BlockId, BlockPatch};
use serde::{Deserialize, Serialize};

/// Who last edited a block, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditStamp {
    pub updated_at: DateTime<Utc>,
    pub last_edited_by: String,
}

impl EditStamp {
    pub fn of(block: &Block) -> Self {
        Self {
            updated_at: block.updated_at,
            last_edited_by: block.last_edited_by.clone(),
        }
    }

    pub fn stamp(&self, block: &mut Block) {
        block.updated_at = self.updated_at;
        block.last_edited_by = self.last_edited_by.clone();
    }
}

/// Position of a block in the tree. `index` is meaningful only under a
/// parent; root order follows creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BlockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl Placement {
    pub fn root() -> Self {
        Self {
            parent_id: None,
            index: None,
        }
    }

    pub fn under(parent_id: BlockId, index: usize) -> Self {
        Self {
            parent_id: Some(parent_id),
            index: Some(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OperationKind {
    Insert {
        block: Box<Block>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    Delete {
        block: Box<Block>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    Update {
        before: BlockPatch,
        after: BlockPatch,
    },

    Move {
        from: Placement,
        to: Placement,
        #[serde(rename = "previousStamp")]
        previous_stamp: EditStamp,
        stamp: EditStamp,
    },
}

/// One entry of the operation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOperation {
    #[serde(flatten)]
    pub kind: OperationKind,
    pub block_id: BlockId,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

impl EditorOperation {
    pub fn new(kind: OperationKind, block_id: BlockId, user_id: &str) -> Self {
        Self {
            kind,
            block_id,
            timestamp: Utc::now(),
            user_id: user_id.to_string(),
        }
    }

    /// The operation that undoes this one, for broadcasting undo
    pub fn inverse(&self) -> Self {
        let kind = match &self.kind {
            OperationKind::Insert { block, index } => OperationKind::Delete {
                block: block.clone(),
                index: *index,
            },
            OperationKind::Delete { block, index } => OperationKind::Insert {
                block: block.clone(),
                index: *index,
            },
            OperationKind::Update { before, after } => OperationKind::Update {
                before: after.clone(),
                after: before.clone(),
            },
            OperationKind::Move {
                from,
                to,
                previous_stamp,
                stamp,
            } => OperationKind::Move {
                from: to.clone(),
                to: from.clone(),
                previous_stamp: stamp.clone(),
                stamp: previous_stamp.clone(),
            },
        };
        Self {
            kind,
            block_id: self.block_id.clone(),
            timestamp: Utc::now(),
            user_id: self.user_id.clone(),
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self.kind {
            OperationKind::Insert { .. } => "insert",
            OperationKind::Delete { .. } => "delete",
            OperationKind::Update { .. } => "update",
            OperationKind::Move { .. } => "move",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playbook_model::BlockType;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let op = EditorOperation::new(
            OperationKind::Update {
                before: BlockPatch::new().set("checked", false).unwrap(),
                after: BlockPatch::new().set("checked", true).unwrap(),
            },
            BlockId::new("t"),
            "ana",
        );
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value["type"], "update");
        assert_eq!(value["blockId"], "t");
        assert_eq!(value["userId"], "ana");
        assert_eq!(value["after"], json!({"checked": true}));

        let back: EditorOperation = serde_json::from_value(value).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_insert_carries_block() {
        let block = Block::new(
            BlockId::new("p"),
            BlockType::Paragraph.default_kind(),
            "ana",
            Utc::now(),
        );
        let op = EditorOperation::new(
            OperationKind::Insert {
                block: Box::new(block),
                index: Some(2),
            },
            BlockId::new("p"),
            "ana",
        );
        let back: EditorOperation =
            serde_json::from_str(&serde_json::to_string(&op).unwrap()).unwrap();

        assert_eq!(back.name(), "insert");
        assert_eq!(back, op);
    }

    #[test]
    fn test_inverse_swaps_direction() {
        let stamp = |who: &str| EditStamp {
            updated_at: Utc::now(),
            last_edited_by: who.to_string(),
        };
        let op = EditorOperation::new(
            OperationKind::Move {
                from: Placement::root(),
                to: Placement::under(BlockId::new("p"), 0),
                previous_stamp: stamp("old"),
                stamp: stamp("new"),
            },
            BlockId::new("m"),
            "ana",
        );

        let OperationKind::Move {
            from,
            to,
            previous_stamp,
            ..
        } = op.inverse().kind
        else {
            panic!("expected a move");
        };
        assert_eq!(from, Placement::under(BlockId::new("p"), 0));
        assert_eq!(to, Placement::root());
        assert_eq!(previous_stamp.last_edited_by, "new");
    }
}
