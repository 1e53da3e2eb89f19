use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::{Client, Database};
use serde_json::{Map, Value};

use farmxpress_common::{define_module_client, EnvVars, ModuleClient};

use crate::db_object::{DocumentUpdate, FieldValue, StoredDocument, WriteBatch};
use crate::env::MongoDbEnv;
use crate::store::{DocumentStore, StoreError};

define_module_client! {
    (struct MongoDbClient, "mongodb")
    client_type: Client,
    env: ["MONGODB_URI"],
    setup: async {
        let env = MongoDbEnv::load();
        Client::with_uri_str(env.get_env_var("MONGODB_URI"))
            .await
            .map_err(anyhow::Error::from)
    }
}

/// MongoDB-backed store. Batches run inside a multi-document transaction,
/// which requires the deployment to be a replica set.
#[derive(Clone)]
pub struct MongoStore {
    client: MongoDbClient,
    database: String,
}

impl MongoStore {
    pub async fn connect() -> anyhow::Result<Self> {
        let env = MongoDbEnv::load();
        let client = MongoDbClient::setup_connection().await?;
        tracing::info!("[MongoStore] connected, database: {}", env.mongodb_database);
        Ok(Self {
            client,
            database: env.mongodb_database,
        })
    }

    fn db(&self) -> Database {
        self.client.get_client().database(&self.database)
    }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "_id": id },
    }
}

fn to_stored(mut document: Document) -> StoredDocument {
    let id = document
        .remove("_id")
        .map(|id| id_to_string(&id))
        .unwrap_or_default();
    let data = match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    StoredDocument::new(id, data)
}

fn to_update_document(update: &DocumentUpdate) -> Result<Document, StoreError> {
    let mut set = Document::new();
    let mut current_date = Document::new();
    for (field, value) in &update.fields {
        match value {
            FieldValue::Set(v) => {
                set.insert(field.clone(), bson::to_bson(v)?);
            }
            FieldValue::Clear => {
                set.insert(field.clone(), Bson::Null);
            }
            FieldValue::ServerTimestamp => {
                current_date.insert(field.clone(), true);
            }
        }
    }

    let mut out = Document::new();
    if !set.is_empty() {
        out.insert("$set", set);
    }
    if !current_date.is_empty() {
        out.insert("$currentDate", current_date);
    }
    Ok(out)
}

#[async_trait::async_trait]
impl DocumentStore for MongoStore {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let col = self.db().collection::<Document>(collection);
        let mut filter = Document::new();
        filter.insert(field, value);
        let cursor = col.find(filter, None).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(to_stored).collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let db = self.db();
        let mut session = self.client.get_client().start_session(None).await?;
        session.start_transaction(None).await?;

        let mut result = Ok(());
        for update in batch.updates() {
            let applied = async {
                let col = db.collection::<Document>(update.collection);
                let outcome = col
                    .update_one_with_session(
                        id_filter(&update.id),
                        to_update_document(update)?,
                        None,
                        &mut session,
                    )
                    .await?;
                if outcome.matched_count == 0 {
                    return Err(StoreError::MissingDocument {
                        collection: update.collection.to_string(),
                        id: update.id.clone(),
                    });
                }
                Ok(())
            }
            .await;

            if let Err(e) = applied {
                result = Err(e);
                break;
            }
        }

        match result {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::error!("[MongoStore] failed to abort transaction: {}", abort_err);
                }
                Err(e)
            }
        }
    }
}
