//! Structural checks for block maps read from outside the editor.

use crate::error::{ModelError, ModelResult};
use crate::visitor::{post_order, BlockMap};
use std::collections::HashSet;

/// Check that `blocks` forms a forest whose `parentId` and `children` links
/// agree in both directions
pub fn validate_tree(blocks: &BlockMap) -> ModelResult<()> {
    for (key, block) in blocks {
        if key != &block.id {
            return Err(invalid(format!("key {} holds block {}", key, block.id)));
        }

        if let Some(parent_id) = &block.parent_id {
            let parent = blocks.get(parent_id).ok_or_else(|| {
                invalid(format!("block {} has missing parent {}", block.id, parent_id))
            })?;
            let listed = parent.children.iter().filter(|c| *c == &block.id).count();
            if listed != 1 {
                return Err(invalid(format!(
                    "block {} is listed {} times by its parent {}",
                    block.id, listed, parent_id
                )));
            }
        }

        let mut seen = HashSet::new();
        for child_id in &block.children {
            if !seen.insert(child_id) {
                return Err(invalid(format!(
                    "block {} lists child {} twice",
                    block.id, child_id
                )));
            }
            let child = blocks.get(child_id).ok_or_else(|| {
                invalid(format!("block {} has missing child {}", block.id, child_id))
            })?;
            if child.parent_id.as_ref() != Some(&block.id) {
                return Err(invalid(format!(
                    "child {} of {} points at another parent",
                    child_id, block.id
                )));
            }
        }
    }

    // With consistent links, anything unreachable from a root sits on a cycle
    let reachable: usize = blocks
        .values()
        .filter(|block| block.is_root())
        .map(|root| post_order(blocks, root).len())
        .sum();
    if reachable != blocks.len() {
        return Err(invalid(format!(
            "{} blocks are not reachable from a root",
            blocks.len() - reachable
        )));
    }

    Ok(())
}

fn invalid(message: String) -> ModelError {
    ModelError::InvalidTree(message)
}
