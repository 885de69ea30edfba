//! Wire types for the store's REST surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body of an append request.
///
/// The store answers `POST <collection>.json` with the key it generated
/// for the new child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResponse {
    /// Store-generated key of the appended value.
    pub name: String,
}

/// Payload of a `put` or `patch` stream frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPayload {
    /// Tree location relative to the subscribed path.
    pub path: String,

    /// Value written at that location. `null` means the node was removed.
    pub data: Value,
}
