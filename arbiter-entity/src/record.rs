//! The canonical entity record handed to evaluators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{EntityUid, RawEntity};

/// `{ "uid": "Type::\"id\"", "attrs": {..}, "parents": ["Type::\"id\"", ..] }`
///
/// `attrs` is kept sorted by key and `parents` sorted by uid, so two
/// serializations of the same store are byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub uid: EntityUid,
    #[serde(default)]
    pub attrs: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub parents: Vec<EntityUid>,
}

impl From<EntityRecord> for RawEntity {
    fn from(record: EntityRecord) -> Self {
        Self {
            uid: Some(serde_json::Value::String(record.uid.to_string())),
            attrs: record.attrs.into_iter().collect(),
            parents: record
                .parents
                .iter()
                .map(|p| serde_json::Value::String(p.to_string()))
                .collect(),
        }
    }
}
