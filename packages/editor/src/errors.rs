//! Error types for the editor

use playbook_common::StorageError;
use playbook_model::{BlockId, ModelError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Parent not found: {0}")]
    ParentNotFound(BlockId),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Block {0} has no rich text content")]
    NotTextBlock(BlockId),

    #[error("Invalid import: {0}")]
    InvalidFormat(String),

    #[error("History does not match the document: {0}")]
    HistoryConflict(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Suggestion not found: {0}")]
    SuggestionNotFound(String),

    #[error("Conflict not found: {0}")]
    ConflictNotFound(String),

    #[error("Collaboration error: {0}")]
    Collaboration(String),

    #[error("Playbook sink failed: {0}")]
    Sink(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    #[error("Component already exists: {0}")]
    DuplicateComponent(String),

    #[error("Invalid connection {id}: {reason}")]
    InvalidConnection { id: String, reason: String },

    #[error("Canvas template not found: {0}")]
    TemplateNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type CanvasResult<T> = Result<T, CanvasError>;
