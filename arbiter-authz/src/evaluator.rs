//! The evaluator seam.

use tracing::trace;

use crate::error::{AuthzError, AuthzResult};
use crate::{EvaluationInput, Response};

/// Decides a request against policies and entities.
pub trait Evaluator {
    fn evaluate(&self, input: &EvaluationInput) -> AuthzResult<Response>;
}

impl<F> Evaluator for F
where
    F: Fn(&EvaluationInput) -> AuthzResult<Response>,
{
    fn evaluate(&self, input: &EvaluationInput) -> AuthzResult<Response> {
        self(input)
    }
}

/// Adapts an engine that takes the evaluation input as JSON text and answers
/// with a JSON response.
pub struct JsonEvaluator<F> {
    engine: F,
}

impl<F> JsonEvaluator<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    /// Adapts an engine that takes and returns JSON text.
    pub fn new(engine: F) -> Self {
        Self { engine }
    }
}

impl<F> Evaluator for JsonEvaluator<F>
where
    F: Fn(&str) -> Result<String, String>,
{
    fn evaluate(&self, input: &EvaluationInput) -> AuthzResult<Response> {
        let request = input.to_json_string()?;
        trace!(bytes = request.len(), "sending evaluation input");
        let reply = (self.engine)(&request).map_err(AuthzError::Evaluator)?;
        trace!(bytes = reply.len(), "received evaluation response");
        Ok(serde_json::from_str(&reply)?)
    }
}

impl<F> std::fmt::Debug for JsonEvaluator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonEvaluator").finish_non_exhaustive()
    }
}
