//! Error types for the entity model.

use thiserror::Error;

use crate::EntityUid;

/// Result type for entity operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Errors that can occur while building or serializing entities.
#[derive(Debug, Error)]
pub enum EntityError {
    /// An entity-like input is missing its uid or has a wrong-shaped field.
    #[error("malformed entity at index {index}: {reason}")]
    MalformedEntity { index: usize, reason: String },

    /// An attribute value has no representation in the canonical exchange format.
    #[error("attribute `{attribute}` of entity {uid} cannot be serialized: {reason}")]
    UnserializableValue {
        uid: EntityUid,
        attribute: String,
        reason: String,
    },

    /// A string or JSON value is not a valid entity uid.
    #[error("invalid entity uid `{input}`: {reason}")]
    InvalidUid { input: String, reason: String },

    /// The schema document could not be interpreted.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The top-level entity document is not an array of entities.
    #[error("invalid entity document: {0}")]
    InvalidDocument(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EntityError {
    pub(crate) fn invalid_uid(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUid {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEntity {
            index,
            reason: reason.into(),
        }
    }
}
