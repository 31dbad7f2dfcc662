//! Favorites are pure join documents: present means favorited, absent means
//! not. Toggling on creates the document, toggling off hard-deletes it.

use std::sync::Arc;

use bson::Bson;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::Favorite;
use crate::store::DocumentStore;
use crate::sync::now_iso;

pub const FAVORITES: &str = "favorites";

fn favorite_key(user_id: &str, listing_id: &str) -> String {
    format!("{user_id}_{listing_id}")
}

#[derive(Clone)]
pub struct FavoriteService {
    store: Arc<dyn DocumentStore>,
}

impl FavoriteService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        FavoriteService { store }
    }

    /// Flip the favorite state for `(user, listing)`. Returns true when the
    /// listing is favorited after the call.
    pub async fn toggle(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        let key = favorite_key(user_id, listing_id);

        if self.store.get(FAVORITES, &key).await?.is_some() {
            self.store.delete(FAVORITES, &key).await?;
            info!(%user_id, %listing_id, "favorite removed");
            return Ok(false);
        }

        let favorite = Favorite {
            id: key.clone(),
            user_id: user_id.to_string(),
            listing_id: listing_id.to_string(),
            created_at: now_iso(),
        };
        self.store
            .put(FAVORITES, &key, bson::to_document(&favorite)?)
            .await?;
        info!(%user_id, %listing_id, "favorite added");
        Ok(true)
    }

    pub async fn is_favorited(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        let key = favorite_key(user_id, listing_id);
        Ok(self.store.get(FAVORITES, &key).await?.is_some())
    }

    /// Listing ids the user has favorited.
    pub async fn favorites_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        let docs = self
            .store
            .query(FAVORITES, &[("userId", Bson::from(user_id))])
            .await?;
        docs.into_iter()
            .map(|doc| {
                let favorite: Favorite = bson::from_document(doc)?;
                Ok::<String, Error>(favorite.listing_id)
            })
            .collect()
    }
}
