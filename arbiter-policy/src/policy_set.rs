//! Ordered, id-unique collections of policies.

use arbiter_entity::EntityStore;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, trace};

use crate::config::PolicySetConfig;
use crate::error::{DuplicateSite, PolicyError, PolicyResult};
use crate::parser::{DEFAULT_ID_PREFIX, PolicyParser, SourceParser};
use crate::policy::IdOrigin;
use crate::{Policy, PolicyId};

/// The `{id, text}` pair handed to evaluators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: PolicyId,
    pub text: String,
}

impl From<&Policy> for PolicyRecord {
    fn from(policy: &Policy) -> Self {
        Self {
            id: policy.id().clone(),
            text: policy.to_text().to_string(),
        }
    }
}

/// Gives a policy with a generated id the value of its `key` annotation.
///
/// Policies whose id came from the caller or from the source keep it, as do
/// policies without a non-empty `key` annotation.
pub fn apply_id_annotation(policy: Policy, key: &str) -> Policy {
    if policy.id_origin() != IdOrigin::Generated {
        return policy;
    }
    match policy.annotation(key).filter(|value| !value.is_empty()) {
        Some(value) => {
            let id = PolicyId::new(value);
            trace!(from = %policy.id(), to = %id, key, "applied id annotation");
            policy.with_origin(id, IdOrigin::Annotation)
        }
        None => policy,
    }
}

/// Policies plus the entities they were written against.
///
/// Policies keep parse order, followed by programmatically added ones in
/// insertion order. Ids are unique.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    policies: Vec<Policy>,
    index: HashMap<PolicyId, usize>,
    entities: EntityStore,
    id_annotation: Option<String>,
}

impl PolicySet {
    /// An empty set with an empty entity store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses concatenated policy statements.
    pub fn parse(text: &str) -> PolicyResult<Self> {
        Self::builder().source(text).build()
    }

    /// Parses concatenated policy statements, naming generated-id policies
    /// after their `id_annotation` annotation.
    pub fn parse_with(text: &str, id_annotation: &str) -> PolicyResult<Self> {
        Self::builder()
            .source(text)
            .id_annotation(id_annotation)
            .build()
    }

    /// Starts a [`PolicySetBuilder`].
    pub fn builder() -> PolicySetBuilder {
        PolicySetBuilder::default()
    }

    /// Policies in set order.
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Iterates policies in set order.
    pub fn iter(&self) -> std::slice::Iter<'_, Policy> {
        self.policies.iter()
    }

    /// The policy with id `id`.
    pub fn get(&self, id: &str) -> Option<&Policy> {
        self.index.get(id).map(|&slot| &self.policies[slot])
    }

    /// Whether a policy with id `id` is in the set.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Ids in set order.
    pub fn ids(&self) -> impl Iterator<Item = &PolicyId> {
        self.policies.iter().map(Policy::id)
    }

    /// The backing entity store. Empty unless one was supplied.
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// The annotation used to rename generated ids, if any.
    pub fn id_annotation(&self) -> Option<&str> {
        self.id_annotation.as_deref()
    }

    /// `{id, text}` for every policy, in set order.
    pub fn to_policy_records(&self) -> Vec<PolicyRecord> {
        self.policies.iter().map(PolicyRecord::from).collect()
    }
}

impl FromStr for PolicySet {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a PolicySet {
    type Item = &'a Policy;
    type IntoIter = std::slice::Iter<'a, Policy>;

    fn into_iter(self) -> Self::IntoIter {
        self.policies.iter()
    }
}

/// Builder for [`PolicySet`].
#[derive(Default)]
pub struct PolicySetBuilder {
    source: Option<String>,
    policies: Vec<Policy>,
    id_annotation: Option<String>,
    entities: Option<EntityStore>,
    parser: Option<Box<dyn PolicyParser>>,
    config: PolicySetConfig,
}

impl PolicySetBuilder {
    /// Source text holding any number of policy statements.
    #[must_use]
    pub fn source(mut self, text: impl Into<String>) -> Self {
        self.source = Some(text.into());
        self
    }

    /// Adds an already-built policy after the parsed ones.
    #[must_use]
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Adds already-built policies after the parsed ones, in order.
    #[must_use]
    pub fn policies(mut self, policies: impl IntoIterator<Item = Policy>) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Overrides the config's id annotation.
    #[must_use]
    pub fn id_annotation(mut self, key: impl Into<String>) -> Self {
        self.id_annotation = Some(key.into());
        self
    }

    /// The entities the policies are written against.
    #[must_use]
    pub fn entities(mut self, entities: EntityStore) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Replaces the built-in [`SourceParser`].
    ///
    /// The custom parser assigns ids to parsed policies itself, so the
    /// config's `generated_id_prefix` only applies to added policies.
    #[must_use]
    pub fn parser(mut self, parser: impl PolicyParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Takes the id annotation and generated-id prefix from `config`.
    #[must_use]
    pub fn config(mut self, config: PolicySetConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses, renames, and checks ids. Nothing is built unless every policy
    /// ends up with a distinct id.
    ///
    /// Added policies that still carry a generated id are renumbered to
    /// `<prefix><n>`, continuing after the parsed policies and skipping ids
    /// already taken. Only caller, source, and annotation ids can collide.
    pub fn build(self) -> PolicyResult<PolicySet> {
        let Self {
            source,
            policies: added,
            id_annotation,
            entities,
            parser,
            config,
        } = self;

        let parser = match parser {
            Some(parser) => {
                if config.generated_id_prefix != DEFAULT_ID_PREFIX {
                    debug!(
                        prefix = %config.generated_id_prefix,
                        "custom parser assigns parsed ids; prefix applies to added policies only"
                    );
                }
                parser
            }
            None => Box::new(SourceParser::with_id_prefix(
                config.generated_id_prefix.clone(),
            )),
        };
        let id_annotation = id_annotation.or(config.id_annotation);
        let annotate = |policy: Policy| match &id_annotation {
            Some(key) => apply_id_annotation(policy, key),
            None => policy,
        };

        let parsed: Vec<Policy> = match &source {
            Some(text) => parser.parse_policies(text)?,
            None => Vec::new(),
        }
        .into_iter()
        .map(annotate)
        .collect();
        let added: Vec<Policy> = added.into_iter().map(annotate).collect();

        let taken: HashSet<PolicyId> = parsed
            .iter()
            .chain(added.iter().filter(|p| p.id_origin() != IdOrigin::Generated))
            .map(|p| p.id().clone())
            .collect();
        let capacity = parsed.len() + added.len();
        let mut next = parsed.len();
        let added = added.into_iter().map(|policy| {
            if policy.id_origin() != IdOrigin::Generated {
                return policy;
            }
            let id = loop {
                let candidate = PolicyId::new(format!("{}{next}", config.generated_id_prefix));
                next += 1;
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            trace!(from = %policy.id(), to = %id, "renumbered added policy");
            policy.with_origin(id, IdOrigin::Generated)
        });

        let mut policies: Vec<Policy> = Vec::with_capacity(capacity);
        let mut index: HashMap<PolicyId, usize> = HashMap::new();
        for policy in parsed.into_iter().chain(added) {
            if let Some(&slot) = index.get(policy.id()) {
                let first = &policies[slot];
                return Err(PolicyError::DuplicateId {
                    id: policy.id().clone(),
                    first: DuplicateSite {
                        span: first.span(),
                        text: first.to_text().to_string(),
                    },
                    second: DuplicateSite {
                        span: policy.span(),
                        text: policy.to_text().to_string(),
                    },
                });
            }
            index.insert(policy.id().clone(), policies.len());
            policies.push(policy);
        }

        debug!(
            policies = policies.len(),
            id_annotation = id_annotation.as_deref().unwrap_or(""),
            "built policy set"
        );
        Ok(PolicySet {
            policies,
            index,
            entities: entities.unwrap_or_default(),
            id_annotation,
        })
    }
}

impl std::fmt::Debug for PolicySetBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicySetBuilder")
            .field("source", &self.source)
            .field("policies", &self.policies.len())
            .field("id_annotation", &self.id_annotation)
            .field("custom_parser", &self.parser.is_some())
            .field("config", &self.config)
            .finish()
    }
}
