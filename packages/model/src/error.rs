use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Field cannot be patched: {0}")]
    ProtectedField(String),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Text range {offset}..{end} is out of bounds for length {len}")]
    TextRange { offset: usize, end: usize, len: usize },

    #[error("Invalid block tree: {0}")]
    InvalidTree(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
