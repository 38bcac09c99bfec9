//! Stable cache keys derived from a call's logical arguments.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

/// One serializable argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    /// Serialized as RFC 3339 UTC.
    Timestamp(DateTime<Utc>),
    /// Serialized as the enum's wire value.
    Enum(&'static str),
    /// Serialized element-wise, order preserved.
    Seq(Vec<KeyPart>),
}

impl KeyPart {
    fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(n) => JsonValue::from(*n),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::Timestamp(t) => JsonValue::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Enum(v) => JsonValue::String((*v).to_string()),
            Self::Seq(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

impl From<bool> for KeyPart {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for KeyPart {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for KeyPart {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or_else(|_| Self::Text(v.to_string()), Self::Int)
    }
}

impl From<&str> for KeyPart {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<uuid::Uuid> for KeyPart {
    fn from(v: uuid::Uuid) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for KeyPart {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<KeyPart>> From<Vec<T>> for KeyPart {
    fn from(v: Vec<T>) -> Self {
        Self::Seq(v.into_iter().map(Into::into).collect())
    }
}

/// Named arguments of one logical call. Names are kept sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyMaterial {
    parts: BTreeMap<&'static str, KeyPart>,
}

impl KeyMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, part: impl Into<KeyPart>) -> Self {
        self.parts.insert(name, part.into());
        self
    }

    /// Canonical JSON with lexicographically sorted keys.
    pub fn canonical(&self) -> String {
        let map: serde_json::Map<String, JsonValue> = self
            .parts
            .iter()
            .map(|(name, part)| ((*name).to_string(), part.to_json()))
            .collect();
        JsonValue::Object(map).to_string()
    }
}

/// `{prefix}:{sha256(canonical arguments)}`.
pub fn derive_key(prefix: &str, material: &KeyMaterial) -> String {
    let digest = Sha256::digest(material.canonical().as_bytes());
    format!("{prefix}:{}", hex::encode(digest))
}
