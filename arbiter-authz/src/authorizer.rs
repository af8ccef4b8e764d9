//! Authorization front end over an [`Evaluator`].

use arbiter_entity::EntityStore;
use arbiter_policy::PolicySet;
use tracing::{debug, warn};

use crate::error::AuthzResult;
use crate::{EvaluationInput, Evaluator, Request, Response};

/// Front end that prepares evaluator input and checks what comes back.
#[derive(Debug, Clone)]
pub struct Authorizer<E> {
    evaluator: E,
}

impl<E: Evaluator> Authorizer<E> {
    /// Wraps `evaluator`.
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    /// The wrapped evaluator.
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Evaluates `request` against `policies` and `entities`.
    ///
    /// Determining policies the set does not contain are logged and passed
    /// through unchanged.
    pub fn is_authorized(
        &self,
        request: Request,
        policies: &PolicySet,
        entities: &EntityStore,
    ) -> AuthzResult<Response> {
        let input = EvaluationInput::build(policies, entities, request)?;
        let response = self.evaluator.evaluate(&input)?;

        for id in &response.determining_policies {
            if !policies.contains(id.as_str()) {
                warn!(policy_id = %id, "evaluator named a determining policy outside the set");
            }
        }
        for diagnostic in &response.errors {
            debug!(
                policy_id = diagnostic.policy_id.as_ref().map(|id| id.as_str()),
                message = %diagnostic.message,
                "evaluator diagnostic"
            );
        }
        debug!(
            decision = %response.decision,
            determining = response.determining_policies.len(),
            errors = response.errors.len(),
            "authorization evaluated"
        );
        Ok(response)
    }
}
