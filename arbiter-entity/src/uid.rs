//! Entity identifiers.
//!
//! A uid is a type name plus an id, written canonically as `Type::"id"`
//! (e.g. `Photos::User::"alice"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{EntityError, EntityResult};

/// Globally unique, type-tagged identifier of an entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityUid {
    type_name: String,
    id: String,
}

impl EntityUid {
    /// Creates a uid from a type name and an (unescaped) id.
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> EntityResult<Self> {
        let type_name = type_name.into();
        let id = id.into();
        validate_type_name(&type_name)
            .map_err(|reason| EntityError::invalid_uid(format!("{type_name}::{id:?}"), reason))?;
        Ok(Self { type_name, id })
    }

    /// Parses the canonical `Type::"id"` form.
    pub fn parse(input: &str) -> EntityResult<Self> {
        let trimmed = input.trim();
        let Some(sep) = trimmed.find("::\"") else {
            return Err(EntityError::invalid_uid(input, "expected `Type::\"id\"`"));
        };
        let type_name = &trimmed[..sep];
        let quoted = &trimmed[sep + 2..];
        let id = unquote(quoted).map_err(|reason| EntityError::invalid_uid(input, reason))?;
        validate_type_name(type_name).map_err(|reason| EntityError::invalid_uid(input, reason))?;
        Ok(Self {
            type_name: type_name.to_string(),
            id,
        })
    }

    /// Reads a uid from any of its accepted JSON shapes: the canonical string,
    /// `{"type": .., "id": ..}`, or `{"__entity": ..}` wrapping either.
    pub fn from_json(value: &serde_json::Value) -> EntityResult<Self> {
        match value {
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Object(map) => {
                if let Some(inner) = map.get("__entity") {
                    return Self::from_json(inner);
                }
                match (map.get("type"), map.get("id")) {
                    (Some(serde_json::Value::String(t)), Some(serde_json::Value::String(id))) => {
                        Self::new(t.clone(), id.clone())
                    }
                    _ => Err(EntityError::invalid_uid(
                        value.to_string(),
                        "expected string fields `type` and `id`",
                    )),
                }
            }
            other => Err(EntityError::invalid_uid(
                other.to_string(),
                "expected a string or an object",
            )),
        }
    }

    /// Returns the `{"type": .., "id": ..}` form used inside `__entity` escapes.
    pub fn to_json_parts(&self) -> serde_json::Value {
        serde_json::json!({ "type": self.type_name, "id": self.id })
    }

    /// Fully qualified type name (e.g. `Photos::User`).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Unescaped id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last segment of the type name.
    pub fn basename(&self) -> &str {
        self.type_name
            .rsplit_once("::")
            .map(|(_, base)| base)
            .unwrap_or(&self.type_name)
    }

    /// Type name without its last segment; empty for unqualified types.
    pub fn namespace(&self) -> &str {
        self.type_name
            .rsplit_once("::")
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }
}

impl fmt::Display for EntityUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::\"{}\"", self.type_name, escape_str(&self.id))
    }
}

impl FromStr for EntityUid {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EntityUid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityUid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

fn validate_type_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("type name is empty".into());
    }
    for segment in name.split("::") {
        let mut chars = segment.chars();
        let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("`{segment}` is not a valid type name segment"));
        }
    }
    Ok(())
}

/// Reads a double-quoted literal that must span the whole input.
fn unquote(quoted: &str) -> Result<String, String> {
    let Some(body) = quoted.strip_prefix('"') else {
        return Err("id must be a quoted string".into());
    };
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            if i + 1 != body.len() {
                return Err("unexpected characters after closing quote".into());
            }
            return unescape_str(&body[..i]);
        }
    }
    Err("unterminated id string".into())
}

/// Escapes a string for use between double quotes.
pub fn escape_str(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

/// Resolves the escapes accepted inside string literals:
/// `\\ \" \' \n \r \t \0` and `\u{HEX}`.
pub fn unescape_str(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err("expected `{` after `\\u`".into());
                }
                let mut hex = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(h) if h.is_ascii_hexdigit() && hex.len() < 6 => hex.push(h),
                        _ => return Err("malformed `\\u{...}` escape".into()),
                    }
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| "malformed `\\u{...}` escape".to_string())?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| format!("`\\u{{{hex}}}` is not a valid character"))?;
                out.push(ch);
            }
            Some(other) => return Err(format!("unknown escape `\\{other}`")),
            None => return Err("dangling `\\` at end of string".into()),
        }
    }
    Ok(out)
}
