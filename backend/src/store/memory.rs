//! In-memory [`DocumentStore`] used by the test suite and local tooling.
//! A single write lock makes every batch chunk trivially atomic.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bson::{Bson, Document};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::store::{matches_filters, BatchOp, DocumentStore, MAX_BATCH_OPS};

type Collections = HashMap<String, BTreeMap<String, Document>>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

fn with_id(mut doc: Document, id: &str) -> Document {
    doc.insert("id", id);
    doc
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query(&self, collection: &str, filters: &[(&str, Bson)]) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .values()
            .filter(|doc| matches_filters(doc, filters))
            .cloned()
            .collect())
    }

    async fn put(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), with_id(doc, id));
        Ok(())
    }

    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Err(Error::already_exists(collection, id));
        }
        docs.insert(id.to_string(), with_id(doc, id));
        Ok(())
    }

    async fn patch(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Error::not_found(collection, id))?;
        for (key, value) in fields {
            existing.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn batch_write(&self, ops: Vec<BatchOp>) -> Result<()> {
        for chunk in ops.chunks(MAX_BATCH_OPS) {
            let mut collections = self.collections.write().await;
            for op in chunk {
                match op {
                    BatchOp::Put { collection, id, doc } => {
                        collections
                            .entry(collection.clone())
                            .or_default()
                            .insert(id.clone(), with_id(doc.clone(), id));
                    }
                    BatchOp::Delete { collection, id } => {
                        if let Some(docs) = collections.get_mut(collection) {
                            docs.remove(id);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn put_mirrors_id_into_document() {
        let store = MemoryStore::new();
        store
            .put("listings", "l1", doc! { "title": "Unit A" })
            .await
            .unwrap();
        let fetched = store.get("listings", "l1").await.unwrap().unwrap();
        assert_eq!(fetched.get_str("id").unwrap(), "l1");
    }

    #[tokio::test]
    async fn create_rejects_existing_id() {
        let store = MemoryStore::new();
        store.create("listings", "l1", doc! {}).await.unwrap();
        let err = store.create("listings", "l1", doc! {}).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn patch_requires_existing_document() {
        let store = MemoryStore::new();
        let err = store
            .patch("listings", "missing", doc! { "title": "x" })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn patch_merges_fields_shallowly() {
        let store = MemoryStore::new();
        store
            .put("listings", "l1", doc! { "title": "Unit A", "price": 100_000_i64 })
            .await
            .unwrap();
        store
            .patch("listings", "l1", doc! { "price": 110_000_i64 })
            .await
            .unwrap();
        let fetched = store.get("listings", "l1").await.unwrap().unwrap();
        assert_eq!(fetched.get_str("title").unwrap(), "Unit A");
        assert_eq!(fetched.get_i64("price").unwrap(), 110_000);
    }

    #[tokio::test]
    async fn query_matches_all_equality_filters() {
        let store = MemoryStore::new();
        store
            .put("listings", "l1", doc! { "city": "Chatan", "bedrooms": 2_i32 })
            .await
            .unwrap();
        store
            .put("listings", "l2", doc! { "city": "Chatan", "bedrooms": 3_i32 })
            .await
            .unwrap();
        store
            .put("listings", "l3", doc! { "city": "Yomitan", "bedrooms": 2_i32 })
            .await
            .unwrap();

        let hits = store
            .query(
                "listings",
                &[("city", Bson::from("Chatan")), ("bedrooms", Bson::from(2_i32))],
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get_str("id").unwrap(), "l1");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("listings", "l1", doc! {}).await.unwrap();
        store.delete("listings", "l1").await.unwrap();
        store.delete("listings", "l1").await.unwrap();
        assert!(store.get("listings", "l1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn batch_write_handles_more_than_one_chunk() {
        let store = MemoryStore::new();
        let ops: Vec<BatchOp> = (0..(MAX_BATCH_OPS + 17))
            .map(|i| BatchOp::put("listings", &format!("l{i}"), doc! { "n": i as i64 }))
            .collect();
        store.batch_write(ops).await.unwrap();
        assert_eq!(store.len("listings").await, MAX_BATCH_OPS + 17);
    }
}
