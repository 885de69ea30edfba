//! Typed tree paths.
//!
//! Writes keyed by record are only addressable through [`CollectionPath::child`],
//! which takes a validated [`RecordId`]. A node path for a record that has no
//! id cannot be formed.

use std::fmt;

use stockroom_models::{validate_key, InvalidKeyError, RecordId};

/// Path to a collection of records in the database tree.
///
/// One or more `/`-separated segments, each validated against the store's
/// key rules on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// Create a collection path, validating each segment.
    pub fn new(path: impl Into<String>) -> Result<Self, InvalidKeyError> {
        let path = path.into();
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(InvalidKeyError::Empty);
        }
        for segment in trimmed.split('/') {
            validate_key(segment)?;
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Build from a literal already known to satisfy the key rules.
    pub(crate) fn from_static(path: &'static str) -> Self {
        debug_assert!(path.split('/').all(|s| validate_key(s).is_ok()));
        Self(path.to_string())
    }

    /// Path of the node holding the record with the given key.
    pub fn child(&self, id: &RecordId) -> NodePath {
        NodePath(format!("{}/{}", self.0, id.as_str()))
    }

    /// Get the inner path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path to a single record node.
///
/// Only constructible through [`CollectionPath::child`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath(String);

impl NodePath {
    /// Get the inner path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
