//! Policy model for Arbiter.
//!
//! - [`Policy`]: one rule with its source text, id, annotations, and effect
//! - [`PolicySet`]: ordered policies with unique ids plus their backing entities
//! - [`PolicyParser`]: the parsing seam; [`SourceParser`] is the built-in one
//! - [`PolicySetConfig`]: id annotation and generated-id settings, readable from TOML
//!
//! Policy text is kept verbatim. Deciding what a policy means is left to the
//! evaluator.

mod config;
mod error;
mod id;
mod parser;
mod policy;
mod policy_set;

pub use config::PolicySetConfig;
pub use error::{DuplicateSite, PolicyError, PolicyResult};
pub use id::PolicyId;
pub use parser::{DEFAULT_ID_PREFIX, ID_ANNOTATION, PolicyParser, SourceParser};
pub use policy::{Effect, IdOrigin, Policy, PolicyParts, SourceLocation, SourceSpan};
pub use policy_set::{PolicyRecord, PolicySet, PolicySetBuilder, apply_id_annotation};
