use crate::models::TourStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the listing core. Store failures keep the operation
/// and collection so callers can log something actionable before showing a
/// generic message to the end user.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{collection} document not found: {id}")]
    NotFound { collection: String, id: String },

    #[error("{collection} document already exists: {id}")]
    AlreadyExists { collection: String, id: String },

    #[error("listing {id} exists but references a different property")]
    SiblingConflict { id: String },

    #[error("store {op} on {collection} failed: {source}")]
    Store {
        op: &'static str,
        collection: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("tour request {id} is already {from}, cannot move to {to}")]
    InvalidTransition {
        id: String,
        from: TourStatus,
        to: TourStatus,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] bson::ser::Error),

    #[error("failed to deserialize document: {0}")]
    Deserialize(#[from] bson::de::Error),

    #[error("invalid auth token: {0}")]
    Auth(#[from] jsonwebtoken::errors::Error),

    #[error("missing environment variable {name}")]
    Config {
        name: &'static str,
        #[source]
        source: std::env::VarError,
    },
}

impl Error {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn already_exists(collection: &str, id: &str) -> Self {
        Error::AlreadyExists {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn store(op: &'static str, collection: &str, source: mongodb::error::Error) -> Self {
        Error::Store {
            op,
            collection: collection.to_string(),
            source,
        }
    }
}
