//! Error types for editing operations.

use crate::scene::ItemId;
use thiserror::Error;

/// Editing errors.
///
/// Only caller-ordering bugs and malformed data surface here. Expected
/// outcomes (no hit, nothing to undo, dragging something without segments)
/// are reported through `Option`/`bool` returns instead.
#[derive(Debug, Error)]
pub enum EditError {
    /// A component was used before `EditorContext::setup` ran.
    #[error("{0} used before setup")]
    NotInitialized(&'static str),
    /// A drag session was started while another one is still open.
    #[error("a transform session is already active")]
    TransformInProgress,
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for editing operations.
pub type EditResult<T> = Result<T, EditError>;
