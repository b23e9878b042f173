//! # Playbook Model
//!
//! The block document model shared by the editor and its consumers.
//!
//! ## Building Blocks
//!
//! - [`Block`] / [`BlockKind`]: a tree node with type-specific data
//! - [`RichText`]: styled text as a run list
//! - [`BlockPatch`]: partial block for shallow-merge updates and history
//! - [`Visitor`]: depth-first traversal over a [`BlockMap`]

pub mod block;
pub mod error;
pub mod ids;
pub mod patch;
pub mod payload;
pub mod rich_text;
pub mod tree;
pub mod visitor;

pub use block::{Block, BlockCategory, BlockKind, BlockPermissions, BlockType};
pub use error::{ModelError, ModelResult};
pub use ids::{BlockId, IdGenerator};
pub use patch::{BlockPatch, PROTECTED_FIELDS};
pub use rich_text::{AnnotationKind, RichText, TextAnnotation, TextStyle};
pub use tree::validate_tree;
pub use visitor::{post_order, subtree_contains, walk_block, BlockMap, Visitor};
