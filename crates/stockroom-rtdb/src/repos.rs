//! Typed repositories for the units and materials collections.

use serde_json::Value;
use tracing::{debug, info, warn};

use stockroom_models::{Record, RecordId};

use crate::client::RtdbClient;
use crate::error::{RtdbError, RtdbResult};
use crate::path::CollectionPath;
use crate::subscription::Subscription;

/// Collection path for unit records.
pub const UNITS_PATH: &str = "units";

/// Collection path for material records.
pub const MATERIALS_PATH: &str = "materials";

/// Facade over one collection of records.
///
/// Store failures pass through from the client untranslated; nothing here
/// retries, caches, or rewrites errors.
#[derive(Clone)]
pub struct Collection {
    client: RtdbClient,
    path: CollectionPath,
}

impl Collection {
    /// Create a facade for a collection path.
    pub fn new(client: RtdbClient, path: CollectionPath) -> Self {
        Self { client, path }
    }

    /// The collection path this facade addresses.
    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Append a record. The store assigns and returns its key.
    ///
    /// Field values are written as-is; no schema is enforced.
    pub async fn add(&self, record: &Record) -> RtdbResult<RecordId> {
        let value = serde_json::to_value(record)?;
        let id = self.client.push(&self.path, &value).await?;
        info!("Added record {}/{}", self.path, id);
        Ok(id)
    }

    /// Fully overwrite a stored record.
    ///
    /// The record must carry an id; a record that was never stored fails
    /// with [`RtdbError::MissingId`] before any request is made. Fields
    /// absent from `record` are dropped from the store.
    pub async fn update(&self, record: &Record) -> RtdbResult<()> {
        let id = record.id().ok_or_else(|| RtdbError::missing_id("update"))?;
        let value = serde_json::to_value(record)?;
        self.client.put(&self.path.child(id), &value).await?;
        info!("Updated record {}/{}", self.path, id);
        Ok(())
    }

    /// Remove a stored record.
    ///
    /// Same id requirement as [`Collection::update`]. Removing an already
    /// absent record succeeds.
    pub async fn delete(&self, record: &Record) -> RtdbResult<()> {
        let id = record.id().ok_or_else(|| RtdbError::missing_id("delete"))?;
        self.client.remove(&self.path.child(id)).await?;
        info!("Deleted record {}/{}", self.path, id);
        Ok(())
    }

    /// Read one record by key.
    pub async fn get(&self, id: &RecordId) -> RtdbResult<Option<Record>> {
        let value = self.client.get_node(&self.path.child(id)).await?;
        match value {
            Some(Value::Object(fields)) => {
                Ok(Some(Record::from_fields(fields).with_id(id.clone())))
            }
            Some(other) => Err(RtdbError::invalid_response(format!(
                "Expected an object at {}/{}, got {}",
                self.path, id, other
            ))),
            None => Ok(None),
        }
    }

    /// Read all records in the collection.
    pub async fn list(&self) -> RtdbResult<Vec<Record>> {
        let value = self.client.get_tree(&self.path).await?;
        match value {
            Some(tree) => Ok(records_from_tree(tree)),
            None => Ok(Vec::new()),
        }
    }

    /// Subscribe to changes under the collection.
    ///
    /// Each call opens its own stream connection; concurrent subscriptions
    /// observe the same writes independently. Drop the handle to stop.
    pub async fn watch(&self) -> RtdbResult<Subscription> {
        Subscription::open(self.client.clone(), self.path.clone()).await
    }
}

/// Build records from a collection subtree, attaching keys as ids.
///
/// Children that are not JSON objects are skipped.
pub(crate) fn records_from_tree(tree: Value) -> Vec<Record> {
    let children = match tree {
        Value::Object(children) => children,
        other => {
            debug!(value = %other, "Ignoring non-object collection value");
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(children.len());
    for (key, value) in children {
        let id = match RecordId::new(&key) {
            Ok(id) => id,
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping child with unusable key");
                continue;
            }
        };
        match value {
            Value::Object(fields) => records.push(Record::from_fields(fields).with_id(id)),
            other => debug!(key = %key, value = %other, "Skipping non-object record value"),
        }
    }
    records
}

/// Repository for unit records.
#[derive(Clone)]
pub struct UnitRepository {
    collection: Collection,
}

impl UnitRepository {
    /// Create a new unit repository.
    pub fn new(client: RtdbClient) -> Self {
        Self {
            collection: Collection::new(client, CollectionPath::from_static(UNITS_PATH)),
        }
    }

    /// Append a unit. The store assigns and returns its key.
    pub async fn add(&self, unit: &Record) -> RtdbResult<RecordId> {
        self.collection.add(unit).await
    }

    /// Fully overwrite a stored unit. The record must carry an id.
    pub async fn update(&self, unit: &Record) -> RtdbResult<()> {
        self.collection.update(unit).await
    }

    /// Remove a stored unit. The record must carry an id.
    pub async fn delete(&self, unit: &Record) -> RtdbResult<()> {
        self.collection.delete(unit).await
    }

    /// Read one unit by key.
    pub async fn get(&self, id: &RecordId) -> RtdbResult<Option<Record>> {
        self.collection.get(id).await
    }

    /// Read all units.
    pub async fn list(&self) -> RtdbResult<Vec<Record>> {
        self.collection.list().await
    }

    /// Subscribe to changes under the units collection.
    pub async fn watch(&self) -> RtdbResult<Subscription> {
        self.collection.watch().await
    }
}

/// Repository for material records.
#[derive(Clone)]
pub struct MaterialRepository {
    collection: Collection,
}

impl MaterialRepository {
    /// Create a new material repository.
    pub fn new(client: RtdbClient) -> Self {
        Self {
            collection: Collection::new(client, CollectionPath::from_static(MATERIALS_PATH)),
        }
    }

    /// Append a material. The store assigns and returns its key.
    pub async fn add(&self, material: &Record) -> RtdbResult<RecordId> {
        self.collection.add(material).await
    }

    /// Fully overwrite a stored material. The record must carry an id.
    pub async fn update(&self, material: &Record) -> RtdbResult<()> {
        self.collection.update(material).await
    }

    /// Remove a stored material. The record must carry an id.
    pub async fn delete(&self, material: &Record) -> RtdbResult<()> {
        self.collection.delete(material).await
    }

    /// Read one material by key.
    pub async fn get(&self, id: &RecordId) -> RtdbResult<Option<Record>> {
        self.collection.get(id).await
    }

    /// Read all materials.
    pub async fn list(&self) -> RtdbResult<Vec<Record>> {
        self.collection.list().await
    }

    /// Subscribe to changes under the materials collection.
    pub async fn watch(&self) -> RtdbResult<Subscription> {
        self.collection.watch().await
    }
}
