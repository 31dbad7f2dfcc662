//! MongoDB-backed [`DocumentStore`]. Documents are keyed by `_id`; the `_id`
//! is stripped again on the way out so callers only ever see the `id` field,
//! whatever backend they run against.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Collection, Database};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::store::{BatchOp, DocumentStore, MAX_BATCH_OPS};

pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| Error::store("connect", database_name, e))?;
        let database = client.database(database_name);
        info!(database = database_name, "connected to document store");
        Ok(MongoStore { client, database })
    }

    fn coll(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error)) if write_error.code == 11_000
    )
}

fn keyed(mut doc: Document, id: &str) -> Document {
    doc.insert("id", id);
    doc
}

fn strip_storage_key(mut doc: Document) -> Document {
    doc.remove("_id");
    doc
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let found = self
            .coll(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| Error::store("get", collection, e))?;
        Ok(found.map(strip_storage_key))
    }

    async fn query(&self, collection: &str, filters: &[(&str, Bson)]) -> Result<Vec<Document>> {
        let mut filter = Document::new();
        for (field, value) in filters {
            filter.insert(*field, value.clone());
        }
        let cursor = self
            .coll(collection)
            .find(filter)
            .await
            .map_err(|e| Error::store("query", collection, e))?;
        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| Error::store("query", collection, e))?;
        Ok(docs.into_iter().map(strip_storage_key).collect())
    }

    async fn put(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        self.coll(collection)
            .replace_one(doc! { "_id": id }, keyed(doc, id))
            .upsert(true)
            .await
            .map_err(|e| Error::store("put", collection, e))?;
        Ok(())
    }

    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        let mut doc = keyed(doc, id);
        doc.insert("_id", id);
        match self.coll(collection).insert_one(doc).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(Error::already_exists(collection, id)),
            Err(e) => Err(Error::store("create", collection, e)),
        }
    }

    async fn patch(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        let result = self
            .coll(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await
            .map_err(|e| Error::store("patch", collection, e))?;
        if result.matched_count == 0 {
            return Err(Error::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.coll(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| Error::store("delete", collection, e))?;
        Ok(())
    }

    async fn batch_write(&self, ops: Vec<BatchOp>) -> Result<()> {
        // Each chunk runs in its own transaction so the all-or-nothing
        // guarantee holds up to the operation ceiling, as the callers expect.
        for chunk in ops.chunks(MAX_BATCH_OPS) {
            let mut session = self
                .client
                .start_session()
                .await
                .map_err(|e| Error::store("batch_write", "-", e))?;
            session
                .start_transaction()
                .await
                .map_err(|e| Error::store("batch_write", "-", e))?;

            let mut failed: Option<Error> = None;
            for op in chunk {
                let result = match op {
                    BatchOp::Put { collection, id, doc } => self
                        .coll(collection)
                        .replace_one(doc! { "_id": id.as_str() }, keyed(doc.clone(), id))
                        .upsert(true)
                        .session(&mut session)
                        .await
                        .map(|_| ())
                        .map_err(|e| Error::store("batch_write", collection, e)),
                    BatchOp::Delete { collection, id } => self
                        .coll(collection)
                        .delete_one(doc! { "_id": id.as_str() })
                        .session(&mut session)
                        .await
                        .map(|_| ())
                        .map_err(|e| Error::store("batch_write", collection, e)),
                };
                if let Err(e) = result {
                    failed = Some(e);
                    break;
                }
            }

            match failed {
                None => session
                    .commit_transaction()
                    .await
                    .map_err(|e| Error::store("batch_write", "-", e))?,
                Some(e) => {
                    if let Err(abort_err) = session.abort_transaction().await {
                        warn!(error = %abort_err, "failed to abort batch transaction");
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
