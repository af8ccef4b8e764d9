//! The evaluator's view of a request: entity records, policy records, and
//! the request itself.

use arbiter_entity::{EntityRecord, EntityStore};
use arbiter_policy::{PolicyRecord, PolicySet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Request;
use crate::error::AuthzResult;

/// Everything an evaluator needs, in the canonical exchange shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub entities: Vec<EntityRecord>,
    pub policies: Vec<PolicyRecord>,
    pub request: Request,
}

impl EvaluationInput {
    /// Collects the policy set's backing entities followed by `entities`.
    ///
    /// On a uid clash the caller's entity wins. The caller store's schema is
    /// used for serialization, falling back to the policy set store's.
    pub fn build(
        policies: &PolicySet,
        entities: &EntityStore,
        request: Request,
    ) -> AuthzResult<Self> {
        let backing = policies.entities();
        let schema = entities.schema_handle().or_else(|| backing.schema_handle());
        let merged = if backing.is_empty() {
            match schema {
                Some(schema) => entities.clone().with_schema(schema),
                None => entities.clone(),
            }
        } else {
            EntityStore::from_entities(backing.iter().chain(entities).cloned(), schema)?
        };

        let input = Self {
            entities: merged.to_records()?,
            policies: policies.to_policy_records(),
            request,
        };
        debug!(
            entities = input.entities.len(),
            policies = input.policies.len(),
            "built evaluation input"
        );
        Ok(input)
    }

    /// The input as the JSON text a wire engine receives.
    pub fn to_json_string(&self) -> AuthzResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
