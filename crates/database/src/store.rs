use crate::db_object::{StoredDocument, WriteBatch};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[cfg(feature = "mongodb")]
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("bson encoding error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),

    #[error("document decoding error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("document {collection}/{id} does not exist")]
    MissingDocument { collection: String, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The shared document database. Reads are equality lookups on a single
/// field; writes go through `commit`, which applies a whole batch or nothing.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}
