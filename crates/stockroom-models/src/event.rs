//! Collection change events.
//!
//! A subscription yields one [`ChangeEvent::Snapshot`] with the collection's
//! current contents, then `added` / `changed` / `removed` events as other
//! clients write.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::record::{Record, RecordId};

/// Change event kinds (used as logging and metrics labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEventKind {
    /// Initial collection contents
    Snapshot,
    /// Record appeared
    Added,
    /// Record value replaced or partially updated
    Changed,
    /// Record removed
    Removed,
}

impl ChangeEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeEventKind::Snapshot => "snapshot",
            ChangeEventKind::Added => "added",
            ChangeEventKind::Changed => "changed",
            ChangeEventKind::Removed => "removed",
        }
    }
}

/// Change event delivered by a collection subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// Current contents of the collection when the subscription opened.
    Snapshot { records: Vec<Record> },

    /// A record appeared under the collection.
    Added { id: RecordId, record: Record },

    /// An existing record's value changed.
    Changed { id: RecordId, record: Record },

    /// A record was removed from the collection.
    Removed { id: RecordId },
}

impl ChangeEvent {
    /// Create a snapshot event.
    pub fn snapshot(records: Vec<Record>) -> Self {
        ChangeEvent::Snapshot { records }
    }

    /// Create an added event. The id is attached to the record as well.
    pub fn added(id: RecordId, mut record: Record) -> Self {
        record.set_id(id.clone());
        ChangeEvent::Added { id, record }
    }

    /// Create a changed event. The id is attached to the record as well.
    pub fn changed(id: RecordId, mut record: Record) -> Self {
        record.set_id(id.clone());
        ChangeEvent::Changed { id, record }
    }

    /// Create a removed event.
    pub fn removed(id: RecordId) -> Self {
        ChangeEvent::Removed { id }
    }

    /// Get the event kind.
    pub fn kind(&self) -> ChangeEventKind {
        match self {
            ChangeEvent::Snapshot { .. } => ChangeEventKind::Snapshot,
            ChangeEvent::Added { .. } => ChangeEventKind::Added,
            ChangeEvent::Changed { .. } => ChangeEventKind::Changed,
            ChangeEvent::Removed { .. } => ChangeEventKind::Removed,
        }
    }
}
