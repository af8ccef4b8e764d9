//! Error types for authorization calls.

use arbiter_entity::EntityError;
use thiserror::Error;

/// Result type for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Errors that can occur while preparing input for, or talking to, an evaluator.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Entities could not be merged or serialized.
    #[error("entity error: {0}")]
    Entity(#[from] EntityError),

    /// The evaluator itself failed.
    #[error("evaluator error: {0}")]
    Evaluator(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
