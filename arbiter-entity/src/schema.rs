//! Advisory schema metadata.
//!
//! The schema is never enforced here. The entity store only consults it to
//! pick an encoding for attribute values whose JSON form would otherwise be
//! ambiguous (extension values, entity references written as plain strings).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{EntityError, EntityResult};

/// Declared type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttributeType {
    String,
    Long,
    Boolean,
    Set {
        element: Box<AttributeType>,
    },
    Record {
        #[serde(default)]
        attributes: BTreeMap<String, AttributeType>,
    },
    Entity {
        name: String,
    },
    Extension {
        name: String,
    },
}

/// Declaration of one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeDefinition {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_of_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<AttributeType>,
}

/// Entity types and actions declared under one namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDefinition {
    #[serde(default)]
    pub entity_types: BTreeMap<String, EntityTypeDefinition>,
    #[serde(default)]
    pub actions: BTreeMap<String, serde_json::Value>,
}

/// A schema document: namespace name (empty for the root) to declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    namespaces: BTreeMap<String, NamespaceDefinition>,
}

impl Schema {
    /// Parses a JSON schema document.
    pub fn from_json_str(source: &str) -> EntityResult<Self> {
        let schema: Self =
            serde_json::from_str(source).map_err(|e| EntityError::InvalidSchema(e.to_string()))?;
        schema.check_shapes()?;
        Ok(schema)
    }

    /// Interprets an already-parsed JSON schema document.
    pub fn from_json_value(value: serde_json::Value) -> EntityResult<Self> {
        let schema: Self =
            serde_json::from_value(value).map_err(|e| EntityError::InvalidSchema(e.to_string()))?;
        schema.check_shapes()?;
        Ok(schema)
    }

    fn check_shapes(&self) -> EntityResult<()> {
        for name in self.entity_type_names() {
            if let Some(def) = self.entity_type(&name) {
                if !matches!(def.shape, None | Some(AttributeType::Record { .. })) {
                    return Err(EntityError::InvalidSchema(format!(
                        "shape of entity type `{name}` must be a Record"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Looks up an entity type by fully qualified name (`NS::User` or `User`).
    pub fn entity_type(&self, qualified: &str) -> Option<&EntityTypeDefinition> {
        let (namespace, basename) = qualified.rsplit_once("::").unwrap_or(("", qualified));
        self.namespaces.get(namespace)?.entity_types.get(basename)
    }

    /// Declared type of `attribute` on `entity_type`, if any.
    pub fn attribute_type(&self, entity_type: &str, attribute: &str) -> Option<&AttributeType> {
        match self.entity_type(entity_type)?.shape.as_ref()? {
            AttributeType::Record { attributes } => attributes.get(attribute),
            _ => None,
        }
    }

    /// Fully qualified names of every declared entity type, sorted.
    pub fn entity_type_names(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .flat_map(|(ns, def)| {
                def.entity_types.keys().map(move |name| {
                    if ns.is_empty() {
                        name.clone()
                    } else {
                        format!("{ns}::{name}")
                    }
                })
            })
            .collect()
    }

    /// Names of every declared action, sorted by namespace then name.
    pub fn action_names(&self) -> Vec<String> {
        self.namespaces
            .values()
            .flat_map(|def| def.actions.keys().cloned())
            .collect()
    }

    /// A namespace by name. The root namespace is `""`.
    pub fn namespace(&self, name: &str) -> Option<&NamespaceDefinition> {
        self.namespaces.get(name)
    }
}
