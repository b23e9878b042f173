use crate::block::Block;
use crate::ids::BlockId;
use indexmap::IndexMap;

/// Blocks keyed by id, in insertion order
pub type BlockMap = IndexMap<BlockId, Block>;

/// Visitor pattern for traversing a block tree depth-first
///
/// The default implementation walks every child in explicit child order.
/// Override `visit_block` and call [`walk_block`] where the children should
/// be visited (before your work for post-order, after it for pre-order).
pub trait Visitor: Sized {
    fn visit_block(&mut self, blocks: &BlockMap, block: &Block, depth: usize) {
        walk_block(self, blocks, block, depth);
    }
}

pub fn walk_block<V: Visitor>(visitor: &mut V, blocks: &BlockMap, block: &Block, depth: usize) {
    for child_id in &block.children {
        if let Some(child) = blocks.get(child_id) {
            visitor.visit_block(blocks, child, depth + 1);
        }
    }
}

/// Ids of the subtree rooted at `root`, children before their parent
pub fn post_order(blocks: &BlockMap, root: &Block) -> Vec<BlockId> {
    struct PostOrder(Vec<BlockId>);

    impl Visitor for PostOrder {
        fn visit_block(&mut self, blocks: &BlockMap, block: &Block, depth: usize) {
            walk_block(self, blocks, block, depth);
            self.0.push(block.id.clone());
        }
    }

    let mut collector = PostOrder(Vec::new());
    collector.visit_block(blocks, root, 0);
    collector.0
}

/// Whether `target` is `root` or one of its descendants
pub fn subtree_contains(blocks: &BlockMap, root: &Block, target: &BlockId) -> bool {
    struct Finder<'a> {
        target: &'a BlockId,
        found: bool,
    }

    impl Visitor for Finder<'_> {
        fn visit_block(&mut self, blocks: &BlockMap, block: &Block, depth: usize) {
            if self.found {
                return;
            }
            if &block.id == self.target {
                self.found = true;
                return;
            }
            walk_block(self, blocks, block, depth);
        }
    }

    let mut finder = Finder {
        target,
        found: false,
    };
    finder.visit_block(blocks, root, 0);
    finder.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;
    use chrono::Utc;

    fn tree() -> BlockMap {
        // a -> [b -> [c], d]
        let now = Utc::now();
        let mut blocks = BlockMap::new();
        for id in ["a", "b", "c", "d"] {
            let block = Block::new(
                BlockId::new(id),
                BlockType::Paragraph.default_kind(),
                "u",
                now,
            );
            blocks.insert(block.id.clone(), block);
        }
        let link = |blocks: &mut BlockMap, parent: &str, child: &str| {
            blocks[&BlockId::new(child)].parent_id = Some(BlockId::new(parent));
            blocks[&BlockId::new(parent)].children.push(BlockId::new(child));
        };
        link(&mut blocks, "a", "b");
        link(&mut blocks, "b", "c");
        link(&mut blocks, "a", "d");
        blocks
    }

    #[test]
    fn test_post_order_lists_children_first() {
        let blocks = tree();
        let order = post_order(&blocks, &blocks[&BlockId::new("a")]);
        let order: Vec<&str> = order.iter().map(BlockId::as_str).collect();

        assert_eq!(order, vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_subtree_contains() {
        let blocks = tree();
        let b = &blocks[&BlockId::new("b")];

        assert!(subtree_contains(&blocks, b, &BlockId::new("c")));
        assert!(subtree_contains(&blocks, b, &BlockId::new("b")));
        assert!(!subtree_contains(&blocks, b, &BlockId::new("d")));
    }
}
