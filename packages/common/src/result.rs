use crate::error::StorageError;

/// Storage Result type alias
pub type StorageResult<T> = Result<T, StorageError>;
