//! Inventory record and store key types.
//!
//! Records are schemaless: a bag of JSON fields plus an optional
//! store-assigned key. The key is never part of the stored payload; it is
//! the record's location in the database tree, attached on reads.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Maximum UTF-8 length of a store key in bytes.
pub const MAX_KEY_BYTES: usize = 768;

/// Characters the store forbids in keys and path segments.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Error for strings that cannot be used as store keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidKeyError {
    #[error("key is empty")]
    Empty,

    #[error("key exceeds {MAX_KEY_BYTES} bytes (got {len})")]
    TooLong { len: usize },

    #[error("key contains forbidden character {ch:?}")]
    ForbiddenChar { ch: char },
}

/// Check a string against the store's key rules.
///
/// Keys must be non-empty, at most [`MAX_KEY_BYTES`] bytes of UTF-8, and
/// free of `. $ # [ ] /` and ASCII control characters.
pub fn validate_key(key: &str) -> Result<(), InvalidKeyError> {
    if key.is_empty() {
        return Err(InvalidKeyError::Empty);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(InvalidKeyError::TooLong { len: key.len() });
    }
    for ch in key.chars() {
        if FORBIDDEN_KEY_CHARS.contains(&ch) || ch.is_ascii_control() {
            return Err(InvalidKeyError::ForbiddenChar { ch });
        }
    }
    Ok(())
}

/// Store-assigned key of a record within its collection.
///
/// Construction validates the store's key rules, so a `RecordId` always
/// names a real tree location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create a record id, validating the store's key rules.
    pub fn new(s: impl Into<String>) -> Result<Self, InvalidKeyError> {
        let s = s.into();
        validate_key(&s)?;
        Ok(Self(s))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = InvalidKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for RecordId {
    type Error = InvalidKeyError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A schemaless inventory record.
///
/// Serializing a record yields only its fields; the id is carried out of
/// band because it lives in the tree path, not in the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Record {
    /// Store key, present once the record has a location in the tree.
    #[serde(skip)]
    id: Option<RecordId>,

    /// Arbitrary field values. No schema is enforced.
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record with no id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from an existing field map.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { id: None, fields }
    }

    /// Builder-style field setter.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Insert a field, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Look up a field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The record's store key, if it has one.
    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    /// Attach a store key to the record.
    pub fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    /// Builder-style id setter.
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// The record's fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consume the record, returning its field map.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(fields)
    }
}
