//! Deduplicating entity store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{EntityError, EntityResult};
use crate::{Entity, EntityLike, EntityRecord, EntityUid, RawEntity, Schema};

/// A set of entities keyed by uid, plus an optional advisory schema.
///
/// Built once and read afterwards; there is no mutation API. When the input
/// holds several entities with the same uid, the last one wins and takes the
/// position where that uid first appeared.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
    index: HashMap<EntityUid, usize>,
    schema: Option<Arc<Schema>>,
}

impl EntityStore {
    /// An empty store without a schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from built entities and/or raw records.
    ///
    /// Fails on the first malformed element; nothing is kept in that case.
    pub fn from_entities<I, E>(initial: I, schema: Option<Arc<Schema>>) -> EntityResult<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityLike>,
    {
        let mut entities: Vec<Entity> = Vec::new();
        let mut index: HashMap<EntityUid, usize> = HashMap::new();
        let mut replaced = 0usize;

        for (i, item) in initial.into_iter().enumerate() {
            let entity = item.into().resolve(i)?;
            match index.get(entity.uid()) {
                Some(&slot) => {
                    trace!(uid = %entity.uid(), index = i, "replacing entity with duplicate uid");
                    entities[slot] = entity;
                    replaced += 1;
                }
                None => {
                    index.insert(entity.uid().clone(), entities.len());
                    entities.push(entity);
                }
            }
        }

        debug!(
            entities = entities.len(),
            replaced,
            has_schema = schema.is_some(),
            "built entity store"
        );
        Ok(Self {
            entities,
            index,
            schema,
        })
    }

    /// Builds a store from a JSON array of entity records.
    pub fn from_json_value(
        value: serde_json::Value,
        schema: Option<Arc<Schema>>,
    ) -> EntityResult<Self> {
        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(EntityError::InvalidDocument(format!(
                    "expected an array of entities, got {other}"
                )));
            }
        };
        let raws = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| RawEntity::from_json(item, i))
            .collect::<EntityResult<Vec<_>>>()?;
        Self::from_entities(raws, schema)
    }

    /// Builds a store from JSON text holding an array of entity records.
    pub fn from_json_str(source: &str, schema: Option<Arc<Schema>>) -> EntityResult<Self> {
        let value: serde_json::Value = serde_json::from_str(source)?;
        Self::from_json_value(value, schema)
    }

    /// Builds a store back from canonical records.
    pub fn from_records<I>(records: I, schema: Option<Arc<Schema>>) -> EntityResult<Self>
    where
        I: IntoIterator<Item = EntityRecord>,
    {
        Self::from_entities(records, schema)
    }

    /// Returns a copy of this store carrying `schema`.
    #[must_use]
    pub fn with_schema(self, schema: Arc<Schema>) -> Self {
        Self {
            schema: Some(schema),
            ..self
        }
    }

    /// The schema steering serialization, if any.
    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    /// Shared handle to the schema, for building related stores.
    pub fn schema_handle(&self) -> Option<Arc<Schema>> {
        self.schema.clone()
    }

    /// Number of distinct uids.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether an entity with `uid` is stored.
    pub fn contains(&self, uid: &EntityUid) -> bool {
        self.index.contains_key(uid)
    }

    /// The stored entity for `uid`.
    pub fn get(&self, uid: &EntityUid) -> Option<&Entity> {
        self.index.get(uid).map(|&slot| &self.entities[slot])
    }

    /// Iterates every entity once, in store order. Each call starts over.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    /// Every entity, in store order.
    pub fn to_vec(&self) -> Vec<Entity> {
        self.entities.clone()
    }

    /// All uids reachable through parent edges, not including `uid` itself.
    ///
    /// Parent cycles are tolerated. Parents that are not in the store are
    /// reported but not followed.
    pub fn ancestors(&self, uid: &EntityUid) -> BTreeSet<EntityUid> {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<&EntityUid> = self
            .get(uid)
            .map(|e| e.parents().iter().collect())
            .unwrap_or_default();
        while let Some(next) = pending.pop() {
            if next == uid || !seen.insert(next.clone()) {
                continue;
            }
            if let Some(parent) = self.get(next) {
                pending.extend(parent.parents());
            }
        }
        seen
    }

    /// Whether `ancestor` is reachable from `descendant` through parents.
    pub fn is_ancestor(&self, ancestor: &EntityUid, descendant: &EntityUid) -> bool {
        self.ancestors(descendant).contains(ancestor)
    }

    /// Canonical records for every entity, in store order.
    pub fn to_records(&self) -> EntityResult<Vec<EntityRecord>> {
        let schema = self.schema();
        self.entities
            .iter()
            .map(|entity| entity.to_record(schema))
            .collect()
    }

    /// The canonical records as a JSON array.
    pub fn to_json_value(&self) -> EntityResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_records()?)?)
    }

    /// The canonical records as compact JSON text.
    pub fn to_json_string(&self) -> EntityResult<String> {
        Ok(serde_json::to_string(&self.to_records()?)?)
    }
}

impl<'a> IntoIterator for &'a EntityStore {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl IntoIterator for EntityStore {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}
