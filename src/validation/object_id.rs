use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// 24-character hexadecimal document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ObjectId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid ID format: {0}")]
pub struct InvalidObjectId(pub String);

impl ObjectId {
    /// Seconds since the epoch in the first 8 hex chars keeps ids roughly time ordered
    pub fn new() -> Self {
        let seconds = chrono::Utc::now().timestamp().max(0) as u32;
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{:08x}{}", seconds, &random[..16]))
    }

    pub fn parse(value: &str) -> Result<Self, InvalidObjectId> {
        if is_valid_object_id(value) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(InvalidObjectId(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ObjectId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub fn is_valid_object_id(value: &str) -> bool {
    value.len() == 24 && value.chars().all(|c| c.is_ascii_hexdigit())
}
