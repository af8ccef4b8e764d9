//! Policy set settings.

use serde::{Deserialize, Serialize};

use crate::error::PolicyResult;
use crate::parser::DEFAULT_ID_PREFIX;

/// Settings for building a [`PolicySet`](crate::PolicySet).
///
/// ```toml
/// id_annotation = "description"
/// generated_id_prefix = "rule"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySetConfig {
    /// Annotation whose value replaces generated policy ids.
    #[serde(default)]
    pub id_annotation: Option<String>,
    #[serde(default = "default_id_prefix")]
    pub generated_id_prefix: String,
}

fn default_id_prefix() -> String {
    DEFAULT_ID_PREFIX.to_string()
}

impl Default for PolicySetConfig {
    fn default() -> Self {
        Self {
            id_annotation: None,
            generated_id_prefix: default_id_prefix(),
        }
    }
}

impl PolicySetConfig {
    /// Reads a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> PolicyResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Sets the annotation whose value names generated-id policies.
    #[must_use]
    pub fn with_id_annotation(mut self, key: impl Into<String>) -> Self {
        self.id_annotation = Some(key.into());
        self
    }
}
