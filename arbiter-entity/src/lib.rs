//! Entity model for Arbiter.
//!
//! Holds the entities an authorization request reasons about:
//! - [`EntityUid`]: type-tagged identifier, canonically `Type::"id"`
//! - [`Value`]: structured attribute values (sets, records, entity references, extensions)
//! - [`Entity`]: uid, attributes, and direct parents; equal by uid only
//! - [`EntityStore`]: deduplicated, read-only collection of entities
//! - [`Schema`]: advisory metadata steering serialization of ambiguous values
//! - [`EntityRecord`]: the canonical `{uid, attrs, parents}` exchange shape
//!
//! Everything here is plain owned data. Nothing performs I/O.

mod entity;
mod error;
mod record;
mod schema;
mod store;
mod uid;
mod value;

pub use entity::{Entity, EntityLike, RawEntity};
pub use error::{EntityError, EntityResult};
pub use record::EntityRecord;
pub use schema::{AttributeType, EntityTypeDefinition, NamespaceDefinition, Schema};
pub use store::EntityStore;
pub use uid::{EntityUid, escape_str, unescape_str};
pub use value::Value;
