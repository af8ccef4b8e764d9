//! Entities, and the loose JSON form they may arrive in.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use crate::error::{EntityError, EntityResult};
use crate::record::EntityRecord;
use crate::{EntityUid, Schema, Value};

/// A single node of the entity graph: uid, attributes, and direct parents.
///
/// Equality and hashing look at the uid only. Two entities with the same
/// uid are the same entity even when their attributes differ.
#[derive(Debug, Clone)]
pub struct Entity {
    uid: EntityUid,
    attrs: BTreeMap<String, Value>,
    parents: BTreeSet<EntityUid>,
}

impl Entity {
    /// Builds an entity from its uid, attributes, and parents.
    pub fn new<A, K, P>(uid: EntityUid, attrs: A, parents: P) -> Self
    where
        A: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
        P: IntoIterator<Item = EntityUid>,
    {
        Self {
            uid,
            attrs: attrs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            parents: parents.into_iter().collect(),
        }
    }

    /// An entity with no attributes and no parents.
    pub fn with_uid(uid: EntityUid) -> Self {
        Self {
            uid,
            attrs: BTreeMap::new(),
            parents: BTreeSet::new(),
        }
    }

    /// The identity of the entity.
    pub fn uid(&self) -> &EntityUid {
        &self.uid
    }

    /// Attributes by name.
    pub fn attrs(&self) -> &BTreeMap<String, Value> {
        &self.attrs
    }

    /// One attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Direct parents only. See [`EntityStore::ancestors`](crate::EntityStore::ancestors) for the closure.
    pub fn parents(&self) -> &BTreeSet<EntityUid> {
        &self.parents
    }

    /// Whether `uid` is a direct parent.
    pub fn has_parent(&self, uid: &EntityUid) -> bool {
        self.parents.contains(uid)
    }

    /// Produces the canonical `{uid, attrs, parents}` record.
    ///
    /// `schema`, when given, chooses the encoding of values whose plain JSON
    /// form would be ambiguous.
    pub fn to_record(&self, schema: Option<&Schema>) -> EntityResult<EntityRecord> {
        let mut attrs = BTreeMap::new();
        for (key, value) in &self.attrs {
            let hint = schema.and_then(|s| s.attribute_type(self.uid.type_name(), key));
            let encoded =
                value
                    .encode(hint, "")
                    .map_err(|reason| EntityError::UnserializableValue {
                        uid: self.uid.clone(),
                        attribute: key.clone(),
                        reason,
                    })?;
            attrs.insert(key.clone(), encoded);
        }
        Ok(EntityRecord {
            uid: self.uid.clone(),
            attrs,
            parents: self.parents.iter().cloned().collect(),
        })
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uid.hash(state);
    }
}

/// A loosely-typed entity record, as it arrives from JSON or from callers
/// that have not built an [`Entity`] yet. Every field is checked when the
/// record is resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub uid: Option<serde_json::Value>,
    #[serde(default)]
    pub attrs: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub parents: Vec<serde_json::Value>,
}

impl RawEntity {
    /// A raw entity with no attributes or parents.
    pub fn new(uid: impl Into<serde_json::Value>) -> Self {
        Self {
            uid: Some(uid.into()),
            ..Self::default()
        }
    }

    /// Adds a raw JSON attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Adds a raw parent uid.
    pub fn parent(mut self, uid: impl Into<serde_json::Value>) -> Self {
        self.parents.push(uid.into());
        self
    }

    /// Reads one element of an entity document. `index` names the element in
    /// error messages.
    pub fn from_json(value: serde_json::Value, index: usize) -> EntityResult<Self> {
        if !value.is_object() {
            return Err(EntityError::malformed(
                index,
                format!("expected an object, got {value}"),
            ));
        }
        serde_json::from_value(value).map_err(|e| EntityError::malformed(index, e.to_string()))
    }

    /// Converts into an [`Entity`], checking every field.
    pub fn into_entity(self, index: usize) -> EntityResult<Entity> {
        let uid = match &self.uid {
            None | Some(serde_json::Value::Null) => {
                return Err(EntityError::malformed(index, "missing `uid`"));
            }
            Some(uid) => EntityUid::from_json(uid)
                .map_err(|e| EntityError::malformed(index, format!("invalid `uid`: {e}")))?,
        };

        let mut attrs = BTreeMap::new();
        for (key, raw) in &self.attrs {
            let value = Value::from_json(raw).map_err(|reason| {
                EntityError::malformed(index, format!("attribute `{key}` of {uid}: {reason}"))
            })?;
            attrs.insert(key.clone(), value);
        }

        let parents = self
            .parents
            .iter()
            .map(|raw| {
                EntityUid::from_json(raw).map_err(|e| {
                    EntityError::malformed(index, format!("parent of {uid}: {e}"))
                })
            })
            .collect::<EntityResult<BTreeSet<_>>>()?;

        Ok(Entity {
            uid,
            attrs,
            parents,
        })
    }
}

/// Input accepted by the entity store: an already-built entity or a raw
/// record still to be checked.
#[derive(Debug, Clone)]
pub enum EntityLike {
    Built(Entity),
    Raw(RawEntity),
}

impl EntityLike {
    /// Resolves to an [`Entity`]; `index` is the position in the input.
    pub fn resolve(self, index: usize) -> EntityResult<Entity> {
        match self {
            Self::Built(entity) => Ok(entity),
            Self::Raw(raw) => raw.into_entity(index),
        }
    }
}

impl From<Entity> for EntityLike {
    fn from(entity: Entity) -> Self {
        Self::Built(entity)
    }
}

impl From<RawEntity> for EntityLike {
    fn from(raw: RawEntity) -> Self {
        Self::Raw(raw)
    }
}

impl From<EntityRecord> for EntityLike {
    fn from(record: EntityRecord) -> Self {
        Self::Raw(record.into())
    }
}
