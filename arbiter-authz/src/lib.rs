//! Evaluator contract for Arbiter.
//!
//! Arbiter does not decide requests itself. This crate turns a
//! [`PolicySet`](arbiter_policy::PolicySet) and an
//! [`EntityStore`](arbiter_entity::EntityStore) into an [`EvaluationInput`],
//! hands it to an [`Evaluator`], and reads back a [`Response`].

mod authorizer;
mod error;
mod evaluator;
mod input;
mod request;

pub use authorizer::Authorizer;
pub use error::{AuthzError, AuthzResult};
pub use evaluator::{Evaluator, JsonEvaluator};
pub use input::EvaluationInput;
pub use request::{Decision, Diagnostic, Request, Response};
