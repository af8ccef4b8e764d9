//! Error types for policies and policy sets.

use thiserror::Error;

use crate::{PolicyId, SourceLocation, SourceSpan};

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur while parsing policies or assembling a policy set.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Policy source text could not be parsed.
    #[error("syntax error{}: {message}", at(.location))]
    Syntax {
        message: String,
        location: Option<SourceLocation>,
    },

    /// Two policies in one set resolved to the same id.
    #[error("duplicate policy id `{id}`: defined at {} and again at {}", .first.span, .second.span)]
    DuplicateId {
        id: PolicyId,
        first: DuplicateSite,
        second: DuplicateSite,
    },

    /// Policy set configuration could not be read.
    #[error("invalid policy set config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Where one of two clashing policies came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSite {
    pub span: SourceSpan,
    pub text: String,
}

impl PolicyError {
    pub(crate) fn syntax(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self::Syntax {
            message: message.into(),
            location,
        }
    }

    /// Location of a syntax error, if the parser reported one.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Syntax { location, .. } => *location,
            _ => None,
        }
    }
}

fn at(location: &Option<SourceLocation>) -> String {
    location.map(|l| format!(" at {l}")).unwrap_or_default()
}
