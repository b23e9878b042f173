//! # Playbook Editor
//!
//! Block document editing engine for Playbook.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Block tree, rich text, patches       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditorService                       │
//! │  - Apply operations with validation         │
//! │  - Record them for undo/redo                │
//! │  - Announce events, broadcast to peers      │
//! │  - Autosave, templates, JSON/Markdown       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ common: key-value storage                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The block map is the source of truth**: Markdown and stats are derived
//! 2. **Operations carry both sides**: every history entry can be reverted
//! 3. **Remote edits never enter local history**
//! 4. **No globals**: one service per document, torn down explicitly
//!
//! ## Usage
//!
//! ```rust,ignore
//! use playbook_common::MemoryStore;
//! use playbook_editor::{EditorOptions, EditorService};
//! use playbook_model::{BlockPatch, BlockType};
//!
//! let mut editor = EditorService::new(EditorOptions::default(), MemoryStore::new());
//! let heading = editor.create_block(BlockType::Heading1, None, None)?;
//! editor.insert_text(&heading.id, 0, "Onboarding")?;
//!
//! assert!(editor.undo());
//! println!("{}", editor.export_markdown());
//! ```
//!
//! The [`canvas`] module is a separate snapshot-based editor for positioned
//! components.

pub mod autosave;
pub mod canvas;
pub mod codec;
pub mod collaboration;
mod errors;
pub mod events;
mod history;
pub mod markdown;
mod operations;
pub mod playbook;
mod selection;
mod service;
pub mod settings;
mod store;
pub mod templates;

pub use canvas::{CanvasEditor, CanvasOptions};
pub use collaboration::{
    ChannelTransport, CollaborationMessage, CollaborationTransport, CollaborationUser, Comment,
    Conflict, ConflictResolution, Suggestion, SuggestionKind, SuggestionStatus,
};
pub use errors::{CanvasError, CanvasResult, EditorError, EditorResult};
pub use events::{EditorEvent, EventKind, SubscriptionId};
pub use history::History;
pub use operations::{EditStamp, EditorOperation, OperationKind, Placement};
pub use playbook::{
    DocumentStats, Playbook, PlaybookDraft, PlaybookSink, StoreSink, Visibility,
};
pub use selection::EditorSelection;
pub use service::EditorService;
pub use settings::{EditorOptions, EditorSettings, Theme};
pub use store::DocumentStore;
pub use templates::{DocumentTemplate, TemplateLibrary};

// Re-export model types for convenience
pub use playbook_model::{Block, BlockId, BlockMap, BlockPatch, BlockType, RichText, TextStyle};
