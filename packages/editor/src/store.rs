//! # Document Store
//!
//! The in-memory block tree. Every mutation validates before touching state
//! and returns the [`EditorOperation`]s that describe it; recording them,
//! emitting events and broadcasting are the caller's job.
//!
//! ## Invariants
//!
//! - Block ids are unique
//! - `parentId` and the parent's `children` always agree
//! - A block is only removed once it has no children

use crate::errors::{EditorError, EditorResult};
use crate::operations::{EditStamp, EditorOperation, OperationKind, Placement};
use chrono::Utc;
use playbook_model::{
    post_order, subtree_contains, validate_tree, Block, BlockId, BlockMap, BlockPatch, BlockType,
    IdGenerator,
};
use tracing::debug;

#[derive(Debug)]
pub struct DocumentStore {
    blocks: BlockMap,
    ids: IdGenerator,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::with_id_generator(IdGenerator::new())
    }

    pub fn with_id_generator(ids: IdGenerator) -> Self {
        Self {
            blocks: BlockMap::new(),
            ids,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn blocks(&self) -> &BlockMap {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks whose `parentId` equals `parent`, oldest first. Blocks created
    /// in the same instant keep insertion order.
    pub fn by_parent(&self, parent: Option<&BlockId>) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self
            .blocks
            .values()
            .filter(|block| block.parent_id.as_ref() == parent)
            .collect();
        blocks.sort_by_key(|block| block.created_at);
        blocks
    }

    pub fn roots(&self) -> Vec<&Block> {
        self.by_parent(None)
    }

    /// Children of `id` in explicit child order
    pub fn children_of(&self, id: &BlockId) -> EditorResult<Vec<&Block>> {
        let block = self.require(id)?;
        Ok(block
            .children
            .iter()
            .filter_map(|child| self.blocks.get(child))
            .collect())
    }

    /// Case-insensitive substring search over text content and titles
    pub fn search(&self, query: &str) -> Vec<&Block> {
        let needle = query.to_lowercase();
        self.blocks
            .values()
            .filter(|block| block.matches(&needle))
            .collect()
    }

    pub fn word_count(&self) -> usize {
        self.blocks.values().map(Block::word_count).sum()
    }

    pub fn count_of(&self, block_type: BlockType) -> usize {
        self.blocks
            .values()
            .filter(|block| block.block_type() == block_type)
            .count()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a block with the type's defaults, overlay `initial`, and append
    /// it to `parent_id`'s children
    pub fn create(
        &mut self,
        block_type: BlockType,
        initial: Option<&BlockPatch>,
        parent_id: Option<&BlockId>,
        user: &str,
    ) -> EditorResult<EditorOperation> {
        if let Some(parent_id) = parent_id {
            if !self.contains(parent_id) {
                return Err(EditorError::ParentNotFound(parent_id.clone()));
            }
        }

        let id = self.fresh_id();
        let mut block = Block::new(id.clone(), block_type.default_kind(), user, Utc::now());
        if let Some(patch) = initial {
            block = patch.apply(&block)?;
        }
        block.parent_id = parent_id.cloned();

        let index = self.insert_block(block.clone(), None)?;
        debug!(block_id = %id, block_type = %block.block_type(), "Created block");

        Ok(EditorOperation::new(
            OperationKind::Insert {
                block: Box::new(block),
                index,
            },
            id,
            user,
        ))
    }

    /// Shallow-merge `patch` into the block and stamp the edit
    pub fn update(
        &mut self,
        id: &BlockId,
        patch: &BlockPatch,
        user: &str,
    ) -> EditorResult<EditorOperation> {
        let updated = patch.apply(self.require(id)?)?;
        self.commit_edit(id, updated, user)
    }

    /// Edit a copy of the block in place; committed only if `edit` succeeds
    pub fn edit<F>(&mut self, id: &BlockId, user: &str, edit: F) -> EditorResult<EditorOperation>
    where
        F: FnOnce(&mut Block) -> EditorResult<()>,
    {
        let mut updated = self.require(id)?.clone();
        edit(&mut updated)?;
        self.commit_edit(id, updated, user)
    }

    /// Delete the block and its descendants, children first. Returns one
    /// operation per removed block in removal order.
    pub fn delete(&mut self, id: &BlockId, user: &str) -> EditorResult<Vec<EditorOperation>> {
        let order = post_order(&self.blocks, self.require(id)?);

        let mut operations = Vec::with_capacity(order.len());
        for block_id in order {
            let (block, index) = self.remove_leaf(&block_id)?;
            operations.push(EditorOperation::new(
                OperationKind::Delete {
                    block: Box::new(block),
                    index,
                },
                block_id,
                user,
            ));
        }

        debug!(block_id = %id, removed = operations.len(), "Deleted block");
        Ok(operations)
    }

    /// Move under `new_parent` at `index` (clamped; appended when `None`).
    /// Root moves ignore `index`.
    pub fn move_block(
        &mut self,
        id: &BlockId,
        new_parent: Option<&BlockId>,
        index: Option<usize>,
        user: &str,
    ) -> EditorResult<EditorOperation> {
        self.check_move(id, new_parent)?;

        let previous_stamp = EditStamp::of(self.require(id)?);
        let from = self.placement_of(id)?;
        let stamp = EditStamp {
            updated_at: Utc::now(),
            last_edited_by: user.to_string(),
        };
        let to = self.place(id, new_parent, index, &stamp)?;

        Ok(EditorOperation::new(
            OperationKind::Move {
                from,
                to,
                previous_stamp,
                stamp,
            },
            id.clone(),
            user,
        ))
    }

    /// Copy the block without its children, right after the original
    pub fn duplicate(&mut self, id: &BlockId, user: &str) -> EditorResult<EditorOperation> {
        let mut copy = self.require(id)?.clone();
        let now = Utc::now();

        copy.id = self.fresh_id();
        copy.children.clear();
        copy.created_at = now;
        copy.updated_at = now;

        let after_original = copy
            .parent_id
            .as_ref()
            .and_then(|parent_id| self.blocks.get(parent_id))
            .and_then(|parent| parent.children.iter().position(|child| child == id))
            .map(|position| position + 1);
        let index = self.insert_block(copy.clone(), after_original)?;

        Ok(EditorOperation::new(
            OperationKind::Insert {
                block: Box::new(copy.clone()),
                index,
            },
            copy.id,
            user,
        ))
    }

    /// Replace the whole document after checking the tree
    pub fn replace_all(&mut self, blocks: BlockMap) -> EditorResult<()> {
        validate_tree(&blocks)?;
        self.blocks = blocks;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Replay
    // ------------------------------------------------------------------

    /// Apply a recorded operation forward (redo, remote operations)
    pub fn apply(&mut self, operation: &EditorOperation) -> EditorResult<()> {
        match &operation.kind {
            OperationKind::Insert { block, index } => {
                self.insert_block(block.as_ref().clone(), *index)?;
            }
            OperationKind::Delete { .. } => {
                self.remove_leaf(&operation.block_id)?;
            }
            OperationKind::Update { after, .. } => {
                self.patch_in_place(&operation.block_id, after)?;
            }
            OperationKind::Move { to, stamp, .. } => {
                self.place(&operation.block_id, to.parent_id.as_ref(), to.index, stamp)?;
            }
        }
        Ok(())
    }

    /// Reverse a recorded operation (undo)
    pub fn revert(&mut self, operation: &EditorOperation) -> EditorResult<()> {
        match &operation.kind {
            OperationKind::Insert { .. } => {
                self.remove_leaf(&operation.block_id)?;
            }
            OperationKind::Delete { block, index } => {
                self.insert_block(block.as_ref().clone(), *index)?;
            }
            OperationKind::Update { before, .. } => {
                self.patch_in_place(&operation.block_id, before)?;
            }
            OperationKind::Move {
                from,
                previous_stamp,
                ..
            } => {
                self.place(
                    &operation.block_id,
                    from.parent_id.as_ref(),
                    from.index,
                    previous_stamp,
                )?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require(&self, id: &BlockId) -> EditorResult<&Block> {
        self.blocks
            .get(id)
            .ok_or_else(|| EditorError::BlockNotFound(id.clone()))
    }

    fn fresh_id(&mut self) -> BlockId {
        loop {
            let id = self.ids.new_block_id();
            if !self.blocks.contains_key(&id) {
                return id;
            }
        }
    }

    fn commit_edit(
        &mut self,
        id: &BlockId,
        mut updated: Block,
        user: &str,
    ) -> EditorResult<EditorOperation> {
        updated.touch(user, Utc::now());
        let (before, after) = BlockPatch::diff(self.require(id)?, &updated)?;
        self.blocks.insert(id.clone(), updated);

        Ok(EditorOperation::new(
            OperationKind::Update { before, after },
            id.clone(),
            user,
        ))
    }

    fn patch_in_place(&mut self, id: &BlockId, patch: &BlockPatch) -> EditorResult<()> {
        let updated = patch.apply(self.require(id)?)?;
        self.blocks.insert(id.clone(), updated);
        Ok(())
    }

    /// Insert a childless block and attach it to its parent at `index`
    fn insert_block(&mut self, block: Block, index: Option<usize>) -> EditorResult<Option<usize>> {
        if self.blocks.contains_key(&block.id) {
            return Err(EditorError::HistoryConflict(format!(
                "block {} already exists",
                block.id
            )));
        }
        if !block.children.is_empty() {
            return Err(EditorError::HistoryConflict(format!(
                "block {} arrived with children",
                block.id
            )));
        }

        let position = match &block.parent_id {
            Some(parent_id) => {
                let parent = self
                    .blocks
                    .get_mut(parent_id)
                    .ok_or_else(|| EditorError::ParentNotFound(parent_id.clone()))?;
                let len = parent.children.len();
                let at = index.map_or(len, |index| index.min(len));
                parent.children.insert(at, block.id.clone());
                Some(at)
            }
            None => None,
        };

        self.blocks.insert(block.id.clone(), block);
        Ok(position)
    }

    /// Remove a childless block, detaching it from its parent
    fn remove_leaf(&mut self, id: &BlockId) -> EditorResult<(Block, Option<usize>)> {
        if !self.require(id)?.children.is_empty() {
            return Err(EditorError::HistoryConflict(format!(
                "block {} still has children",
                id
            )));
        }

        let index = self.detach(id);
        let block = self
            .blocks
            .shift_remove(id)
            .ok_or_else(|| EditorError::BlockNotFound(id.clone()))?;
        Ok((block, index))
    }

    /// Remove `id` from its parent's children; returns where it was
    fn detach(&mut self, id: &BlockId) -> Option<usize> {
        let parent_id = self.blocks.get(id)?.parent_id.clone()?;
        let parent = self.blocks.get_mut(&parent_id)?;
        let index = parent.children.iter().position(|child| child == id)?;
        parent.children.remove(index);
        Some(index)
    }

    fn placement_of(&self, id: &BlockId) -> EditorResult<Placement> {
        let block = self.require(id)?;
        Ok(match &block.parent_id {
            Some(parent_id) => Placement {
                parent_id: Some(parent_id.clone()),
                index: self
                    .blocks
                    .get(parent_id)
                    .and_then(|parent| parent.children.iter().position(|child| child == id)),
            },
            None => Placement::root(),
        })
    }

    fn check_move(&self, id: &BlockId, new_parent: Option<&BlockId>) -> EditorResult<()> {
        let block = self.require(id)?;
        if let Some(parent_id) = new_parent {
            if !self.contains(parent_id) {
                return Err(EditorError::ParentNotFound(parent_id.clone()));
            }
            if subtree_contains(&self.blocks, block, parent_id) {
                return Err(EditorError::CycleDetected);
            }
        }
        Ok(())
    }

    /// Re-attach `id` under `parent` and stamp it
    fn place(
        &mut self,
        id: &BlockId,
        parent: Option<&BlockId>,
        index: Option<usize>,
        stamp: &EditStamp,
    ) -> EditorResult<Placement> {
        self.check_move(id, parent)?;
        self.detach(id);

        let placement = match parent {
            Some(parent_id) => {
                let parent_block = self
                    .blocks
                    .get_mut(parent_id)
                    .ok_or_else(|| EditorError::ParentNotFound(parent_id.clone()))?;
                let len = parent_block.children.len();
                let at = index.map_or(len, |index| index.min(len));
                parent_block.children.insert(at, id.clone());
                Placement::under(parent_id.clone(), at)
            }
            None => Placement::root(),
        };

        let block = self
            .blocks
            .get_mut(id)
            .ok_or_else(|| EditorError::BlockNotFound(id.clone()))?;
        block.parent_id = parent.cloned();
        stamp.stamp(block);

        Ok(placement)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
