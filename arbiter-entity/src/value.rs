//! Attribute values and their canonical JSON encoding.

use serde_json::json;
use std::collections::BTreeMap;

use crate::schema::AttributeType;
use crate::EntityUid;

/// A structured attribute value.
///
/// `Float` and `Null` can arrive through loosely-typed input but have no
/// canonical encoding of their own; serializing them fails unless a schema
/// gives them one (a `decimal` extension for floats).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Long(i64),
    Float(f64),
    String(String),
    Null,
    Set(Vec<Value>),
    Record(BTreeMap<String, Value>),
    /// Reference to another entity.
    Entity(EntityUid),
    /// Extension value written as a constructor call, e.g. `ip("10.0.0.1")`.
    Extension { function: String, arg: String },
}

impl Value {
    /// Builds a set from anything convertible to values.
    pub fn set<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Builds a record from `(name, value)` pairs.
    pub fn record<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds an extension value.
    pub fn extension(function: impl Into<String>, arg: impl Into<String>) -> Self {
        Self::Extension {
            function: function.into(),
            arg: arg.into(),
        }
    }

    /// The string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Long`].
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The uid, if this is a [`Value::Entity`].
    pub fn as_entity(&self) -> Option<&EntityUid> {
        match self {
            Self::Entity(uid) => Some(uid),
            _ => None,
        }
    }

    /// Reads a value from loosely-typed JSON, resolving `__entity` and
    /// `__extn` escapes.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        use serde_json::Value as Json;

        match value {
            Json::Null => Ok(Self::Null),
            Json::Bool(b) => Ok(Self::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(long) => Ok(Self::Long(long)),
                None => n
                    .as_f64()
                    .map(Self::Float)
                    .ok_or_else(|| format!("number {n} is out of range")),
            },
            Json::String(s) => Ok(Self::String(s.clone())),
            Json::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Set),
            Json::Object(map) => {
                if map.len() == 1 {
                    if let Some(inner) = map.get("__entity") {
                        return EntityUid::from_json(inner)
                            .map(Self::Entity)
                            .map_err(|e| e.to_string());
                    }
                    if let Some(inner) = map.get("__extn") {
                        return extension_from_json(inner);
                    }
                }
                map.iter()
                    .map(|(k, v)| Self::from_json(v).map(|v| (k.clone(), v)))
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(Self::Record)
            }
        }
    }

    /// Encodes the value in the canonical exchange format.
    ///
    /// `hint` is the declared schema type, if any; `path` locates the value
    /// inside its top-level attribute for error messages.
    pub(crate) fn encode(
        &self,
        hint: Option<&AttributeType>,
        path: &str,
    ) -> Result<serde_json::Value, String> {
        match (self, hint) {
            (Self::Bool(b), _) => Ok(json!(b)),
            (Self::Long(n), _) => Ok(json!(n)),
            (Self::String(s), Some(AttributeType::Extension { name })) => {
                Ok(extension_json(extension_constructor(name), s))
            }
            (Self::String(s), Some(AttributeType::Entity { name })) => EntityUid::new(name.clone(), s.clone())
                .map(|uid| json!({ "__entity": uid.to_json_parts() }))
                .map_err(|e| located(path, e.to_string())),
            (Self::String(s), _) => Ok(json!(s)),
            (Self::Float(f), Some(AttributeType::Extension { name })) if name == "decimal" => {
                format_decimal(*f)
                    .map(|arg| extension_json("decimal", &arg))
                    .map_err(|reason| located(path, reason))
            }
            (Self::Float(f), _) => Err(located(
                path,
                format!("floating-point value {f} has no canonical encoding"),
            )),
            (Self::Null, _) => Err(located(path, "null has no canonical encoding")),
            (Self::Set(items), hint) => {
                let element = match hint {
                    Some(AttributeType::Set { element }) => Some(element.as_ref()),
                    _ => None,
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.encode(element, &format!("{path}[{i}]")))
                    .collect::<Result<Vec<_>, _>>()
                    .map(serde_json::Value::Array)
            }
            (Self::Record(fields), hint) => {
                if fields.len() == 1 && fields.keys().any(|k| k == "__entity" || k == "__extn") {
                    return Err(located(
                        path,
                        "a record whose only key is `__entity` or `__extn` is ambiguous",
                    ));
                }
                let declared = match hint {
                    Some(AttributeType::Record { attributes }) => Some(attributes),
                    _ => None,
                };
                let mut out = serde_json::Map::new();
                for (key, field) in fields {
                    let field_hint = declared.and_then(|attrs| attrs.get(key));
                    out.insert(key.clone(), field.encode(field_hint, &format!("{path}.{key}"))?);
                }
                Ok(serde_json::Value::Object(out))
            }
            (Self::Entity(uid), _) => Ok(json!({ "__entity": uid.to_json_parts() })),
            (Self::Extension { function, arg }, _) => Ok(extension_json(function, arg)),
        }
    }
}

fn extension_from_json(inner: &serde_json::Value) -> Result<Value, String> {
    match (
        inner.get("fn").and_then(|v| v.as_str()),
        inner.get("arg").and_then(|v| v.as_str()),
    ) {
        (Some(function), Some(arg)) => Ok(Value::extension(function, arg)),
        _ => Err(format!(
            "`__extn` expects string fields `fn` and `arg`, got {inner}"
        )),
    }
}

fn extension_json(function: &str, arg: &str) -> serde_json::Value {
    json!({ "__extn": { "fn": function, "arg": arg } })
}

/// Maps an extension type name to the constructor that builds it.
fn extension_constructor(type_name: &str) -> &str {
    match type_name {
        "ipaddr" => "ip",
        other => other,
    }
}

/// Renders a float as a decimal literal with at most four fractional digits.
fn format_decimal(f: f64) -> Result<String, String> {
    if !f.is_finite() {
        return Err(format!("{f} is not a finite decimal"));
    }
    if (f * 10_000.0).round().abs() >= i64::MAX as f64 {
        return Err(format!("{f} is outside the decimal range"));
    }
    let mut s = format!("{f:.4}");
    while s.ends_with('0') && !s.ends_with(".0") {
        s.pop();
    }
    Ok(s)
}

fn located(path: &str, reason: impl Into<String>) -> String {
    let reason = reason.into();
    if path.is_empty() {
        reason
    } else {
        format!("at `{path}`: {reason}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Long(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<EntityUid> for Value {
    fn from(uid: EntityUid) -> Self {
        Self::Entity(uid)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Set(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self::Record(fields)
    }
}
