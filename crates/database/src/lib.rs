mod db_object;
mod env;
mod memory;
mod store;

#[cfg(feature = "mongodb")]
mod mongo_store;

pub use db_object::{DbObject, DocumentUpdate, FieldValue, StoredDocument, WriteBatch};
pub use env::MongoDbEnv;
pub use memory::MemoryStore;
pub use store::{DocumentStore, StoreError};

#[cfg(feature = "mongodb")]
pub use mongo_store::{MongoDbClient, MongoStore};
