//! A single policy: source text, id, and annotations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{PolicyError, PolicyResult};
use crate::parser::{PolicyParser, SourceParser};
use crate::PolicyId;

/// Whether a policy grants or denies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Permit,
    Forbid,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permit => "permit",
            Self::Forbid => "forbid",
        })
    }
}

/// How a policy got its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdOrigin {
    /// Passed in explicitly by the caller.
    Caller,
    /// Written by the author as an `@id("...")` annotation.
    Source,
    /// Taken from the policy set's id annotation.
    Annotation,
    /// Synthesized by the parser.
    Generated,
}

/// A 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// 1-based line and column.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// First and last character of a policy statement in its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Everything a [`PolicyParser`] reports about one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyParts {
    pub id: PolicyId,
    pub id_origin: IdOrigin,
    pub text: String,
    pub annotations: BTreeMap<String, String>,
    pub effect: Effect,
    pub span: SourceSpan,
    pub is_template: bool,
}

/// One authorization rule.
///
/// Immutable once built. Changing the id goes through [`Policy::with_id`],
/// which returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    id: PolicyId,
    id_origin: IdOrigin,
    text: String,
    annotations: BTreeMap<String, String>,
    effect: Effect,
    span: SourceSpan,
    is_template: bool,
}

impl Policy {
    /// Parses a single policy with the built-in parser.
    ///
    /// An explicit `id` always wins over `@id` annotations and generated ids.
    pub fn new(text: &str, id: Option<&str>) -> PolicyResult<Self> {
        Self::parse_with(&SourceParser::default(), text, id)
    }

    /// Parses a single policy with `parser`.
    pub fn parse_with(
        parser: &dyn PolicyParser,
        text: &str,
        id: Option<&str>,
    ) -> PolicyResult<Self> {
        let policy = parser.parse_policy(text, id)?;
        Ok(match id {
            Some(id) if policy.id != *id || policy.id_origin != IdOrigin::Caller => {
                policy.with_id(id)
            }
            _ => policy,
        })
    }

    /// The source text, exactly as it was given.
    pub fn to_text(&self) -> &str {
        &self.text
    }

    /// The id this policy is known by in a set.
    pub fn id(&self) -> &PolicyId {
        &self.id
    }

    /// Where the id came from.
    pub fn id_origin(&self) -> IdOrigin {
        self.id_origin
    }

    /// Annotations by key. Empty when the policy has none.
    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    /// The value of one annotation. A bare `@key` reads as `""`.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Permit or forbid.
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Where the statement sits in the text it was parsed from.
    pub fn span(&self) -> SourceSpan {
        self.span
    }

    /// True when the scope holds a `?principal` or `?resource` slot.
    pub fn is_template(&self) -> bool {
        self.is_template
    }

    /// A copy of this policy carrying a caller-chosen id.
    #[must_use]
    pub fn with_id(&self, id: impl Into<PolicyId>) -> Self {
        self.clone().with_origin(id.into(), IdOrigin::Caller)
    }

    pub(crate) fn with_origin(self, id: PolicyId, id_origin: IdOrigin) -> Self {
        Self {
            id,
            id_origin,
            ..self
        }
    }
}

impl From<PolicyParts> for Policy {
    fn from(parts: PolicyParts) -> Self {
        Self {
            id: parts.id,
            id_origin: parts.id_origin,
            text: parts.text,
            annotations: parts.annotations,
            effect: parts.effect,
            span: parts.span,
            is_template: parts.is_template,
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Policy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s, None)
    }
}
