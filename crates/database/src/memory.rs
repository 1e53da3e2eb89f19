use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::db_object::{FieldValue, StoredDocument, WriteBatch};
use crate::store::{DocumentStore, StoreError};

type Collection = BTreeMap<String, Map<String, Value>>;

/// Process-local document store. Used by tests and local development; a
/// batch is validated against the current contents before any of it is applied.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    fail_next_commit: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, collection: &str, id: &str, data: Value) {
        let data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Map<String, Value>> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Makes the next `commit` fail without applying anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

fn server_timestamp() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(vec![]);
        };

        Ok(docs
            .iter()
            .filter(|(_, data)| data.get(field).and_then(Value::as_str) == Some(value))
            .map(|(id, data)| StoredDocument::new(id.clone(), data.clone()))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        let mut collections = self.collections.write().await;

        for update in batch.updates() {
            let exists = collections
                .get(update.collection)
                .map(|docs| docs.contains_key(&update.id))
                .unwrap_or(false);
            if !exists {
                return Err(StoreError::MissingDocument {
                    collection: update.collection.to_string(),
                    id: update.id.clone(),
                });
            }
        }

        for update in batch.into_updates() {
            let Some(doc) = collections
                .get_mut(update.collection)
                .and_then(|docs| docs.get_mut(&update.id))
            else {
                continue;
            };
            for (field, value) in update.fields {
                let value = match value {
                    FieldValue::Set(v) => v,
                    FieldValue::Clear => Value::Null,
                    FieldValue::ServerTimestamp => server_timestamp(),
                };
                doc.insert(field, value);
            }
        }

        Ok(())
    }
}
