//! Request and response shapes exchanged with evaluators.

use arbiter_entity::EntityUid;
use arbiter_policy::PolicyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Who wants to do what to which resource, and in what context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub principal: EntityUid,
    pub action: EntityUid,
    pub resource: EntityUid,
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl Request {
    /// A request with an empty context.
    pub fn new(principal: EntityUid, action: EntityUid, resource: EntityUid) -> Self {
        Self {
            principal,
            action,
            resource,
            context: serde_json::Map::new(),
        }
    }

    /// Replaces the whole context.
    #[must_use]
    pub fn with_context(mut self, context: serde_json::Map<String, serde_json::Value>) -> Self {
        self.context = context;
        self
    }

    /// Sets one context entry.
    #[must_use]
    pub fn with_context_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Outcome of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Permit,
    Forbid,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permit => "permit",
            Self::Forbid => "forbid",
        })
    }
}

/// A problem the evaluator hit, optionally tied to one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    pub message: String,
}

impl Diagnostic {
    /// A diagnostic not tied to any policy.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            policy_id: None,
            message: message.into(),
        }
    }

    /// A diagnostic raised while evaluating `policy_id`.
    pub fn for_policy(policy_id: impl Into<PolicyId>, message: impl Into<String>) -> Self {
        Self {
            policy_id: Some(policy_id.into()),
            message: message.into(),
        }
    }
}

/// The evaluator's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub decision: Decision,
    #[serde(default)]
    pub determining_policies: BTreeSet<PolicyId>,
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
}

impl Response {
    /// A response with no determining policies and no errors.
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            determining_policies: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    /// Records a policy that contributed to the decision.
    #[must_use]
    pub fn with_determining(mut self, id: impl Into<PolicyId>) -> Self {
        self.determining_policies.insert(id.into());
        self
    }

    /// Appends a diagnostic.
    #[must_use]
    pub fn with_error(mut self, diagnostic: Diagnostic) -> Self {
        self.errors.push(diagnostic);
        self
    }

    /// Whether the decision is [`Decision::Permit`].
    pub fn is_permit(&self) -> bool {
        self.decision == Decision::Permit
    }
}
