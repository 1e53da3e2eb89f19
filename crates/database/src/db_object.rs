use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::store::StoreError;

/// A raw document as read from a collection: its identity plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Map<String, Value>,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self { id: id.into(), data }
    }
}

/// The value written into one field by a `DocumentUpdate`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Set(Value),
    /// Clears the field (stored as null).
    Clear,
    /// Stamped by the store at commit time.
    ServerTimestamp,
}

/// A partial update of one document. Fields not listed are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpdate {
    pub collection: &'static str,
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl DocumentUpdate {
    pub fn new(collection: &'static str, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), FieldValue::Set(value.into()));
        self
    }

    pub fn clear(mut self, field: &str) -> Self {
        self.fields.insert(field.to_string(), FieldValue::Clear);
        self
    }

    pub fn server_timestamp(mut self, field: &str) -> Self {
        self.fields.insert(field.to_string(), FieldValue::ServerTimestamp);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// A set of document updates committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    updates: Vec<DocumentUpdate>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, update: DocumentUpdate) {
        self.updates.push(update);
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn updates(&self) -> &[DocumentUpdate] {
        &self.updates
    }

    pub fn into_updates(self) -> Vec<DocumentUpdate> {
        self.updates
    }
}

/// A typed record living in a document collection.
pub trait DbObject: Sized + DeserializeOwned + Send + Sync + Clone {
    const COLLECTION_NAME: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    fn from_stored(doc: StoredDocument) -> Result<Self, StoreError> {
        let mut obj: Self = serde_json::from_value(Value::Object(doc.data))?;
        obj.set_id(doc.id);
        Ok(obj)
    }

    fn update_builder(&self) -> DocumentUpdate {
        DocumentUpdate::new(Self::COLLECTION_NAME, self.id())
    }
}
