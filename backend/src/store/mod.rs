//! Thin adapter over a key-based document store. Collections hold schemaless
//! documents addressed by an opaque string id; querying is equality-only, and
//! there are no joins or cross-collection reads.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::error::Result;

/// Batches are applied all-or-nothing per chunk of at most this many
/// operations; larger workloads are chunked by the store itself.
pub const MAX_BATCH_OPS: usize = 500;

#[derive(Debug, Clone)]
pub enum BatchOp {
    Put {
        collection: String,
        id: String,
        doc: Document,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl BatchOp {
    pub fn put(collection: &str, id: &str, doc: Document) -> Self {
        BatchOp::Put {
            collection: collection.to_string(),
            id: id.to_string(),
            doc,
        }
    }

    pub fn delete(collection: &str, id: &str) -> Self {
        BatchOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id. `Ok(None)` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Equality-only filter over a collection; an empty filter list scans the
    /// whole collection.
    async fn query(&self, collection: &str, filters: &[(&str, Bson)]) -> Result<Vec<Document>>;

    /// Full-document replace, upserting when the id is new. The stored
    /// document always carries its own id in an `id` field.
    async fn put(&self, collection: &str, id: &str, doc: Document) -> Result<()>;

    /// Conditional create: fails with [`crate::Error::AlreadyExists`] when the
    /// id is taken. This is the primitive that makes create-if-absent safe
    /// against concurrent writers.
    async fn create(&self, collection: &str, id: &str, doc: Document) -> Result<()>;

    /// Shallow merge of the given fields into an existing document;
    /// [`crate::Error::NotFound`] when it does not exist.
    async fn patch(&self, collection: &str, id: &str, fields: Document) -> Result<()>;

    /// Idempotent delete; deleting a missing id is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Apply puts and deletes with all-or-nothing semantics per
    /// [`MAX_BATCH_OPS`]-sized chunk.
    async fn batch_write(&self, ops: Vec<BatchOp>) -> Result<()>;
}

pub(crate) fn matches_filters(doc: &Document, filters: &[(&str, Bson)]) -> bool {
    filters
        .iter()
        .all(|(field, value)| doc.get(*field) == Some(value))
}
