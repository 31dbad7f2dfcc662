//! Reconciliation between the two denormalized collections the product
//! accumulated: `properties` (primary, first-generation) and `listings`
//! (sibling, what the site actually renders). Every property write fans out
//! here so the listing copy exists and stays current, and listings whose
//! property has disappeared get garbage-collected.

use std::sync::Arc;

use bson::{Bson, Document};
use chrono::{SecondsFormat, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Actor, Listing};
use crate::store::{BatchOp, DocumentStore};

pub const PROPERTIES: &str = "properties";
pub const LISTINGS: &str = "listings";

/// Foreign key on a listing pointing at its property.
const PROPERTY_REF: &str = "propertyId";

/// What a reconciliation pass did for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    CreatedListing,
    UpdatedListing,
}

/// Counters reported by [`SyncService::sync_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub created: u64,
    pub updated: u64,
    pub orphans_removed: u64,
}

#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn DocumentStore>,
}

pub(crate) fn now_iso() -> String {
    // Same format the legacy writers used (`Date.toISOString()`).
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl SyncService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        SyncService { store }
    }

    /// Reconcile the listing copy of one property after the property was
    /// written. Fails with [`Error::NotFound`] when the property itself does
    /// not exist. The create path uses the store's conditional create keyed
    /// by the property id, so two racing calls cannot mint two listings for
    /// one property; the loser falls through to the update path.
    pub async fn sync_property_with_listing(
        &self,
        property_id: &str,
        data: Document,
        actor: &Actor,
    ) -> Result<SyncOutcome> {
        if self.store.get(PROPERTIES, property_id).await?.is_none() {
            error!(%property_id, "cannot sync: property not found");
            return Err(Error::not_found(PROPERTIES, property_id));
        }

        let siblings = self
            .store
            .query(LISTINGS, &[(PROPERTY_REF, Bson::from(property_id))])
            .await?;

        if let Some(sibling) = siblings.first() {
            self.update_listing(property_id, sibling, &data).await?;
            return Ok(SyncOutcome::UpdatedListing);
        }

        let listing_doc = stamp_new_listing(data.clone(), property_id, actor);
        match self.store.create(LISTINGS, property_id, listing_doc).await {
            Ok(()) => {
                info!(%property_id, "created listing for property");
                Ok(SyncOutcome::CreatedListing)
            }
            // Lost the create race; the other writer's listing is there now.
            Err(Error::AlreadyExists { .. }) => {
                let siblings = self
                    .store
                    .query(LISTINGS, &[(PROPERTY_REF, Bson::from(property_id))])
                    .await?;
                match siblings.first() {
                    Some(sibling) => {
                        self.update_listing(property_id, sibling, &data).await?;
                        Ok(SyncOutcome::UpdatedListing)
                    }
                    // The key is held by a document for some other property;
                    // overwriting it would clobber that listing.
                    None => {
                        error!(%property_id, "listing key is taken by an unrelated document");
                        Err(Error::SiblingConflict {
                            id: property_id.to_string(),
                        })
                    }
                }
            }
            Err(e) => {
                error!(%property_id, error = %e, "failed to create listing for property");
                Err(e)
            }
        }
    }

    async fn update_listing(
        &self,
        property_id: &str,
        sibling: &Document,
        data: &Document,
    ) -> Result<()> {
        let sibling_id = sibling.get_str("id").map_err(|_| {
            error!(%property_id, "sibling listing document has no id field");
            Error::not_found(LISTINGS, property_id)
        })?;

        let mut fields = data.clone();
        // The incoming id names the property; the listing keeps its own.
        fields.remove("id");
        fields.insert("updatedAt", now_iso());

        self.store.patch(LISTINGS, sibling_id, fields).await?;
        info!(listing_id = %sibling_id, "updated listing from property");
        Ok(())
    }

    /// Create a property and its listing copy in one atomic batch, stamping
    /// ownership from the actor. Returns the new property id.
    pub async fn create_property_with_listing(
        &self,
        listing: &Listing,
        actor: &Actor,
    ) -> Result<String> {
        let property_id = Uuid::new_v4().to_string();
        let now = now_iso();

        let mut property_doc = bson::to_document(listing)?;
        property_doc.insert("id", property_id.as_str());
        property_doc.insert("status", "active");
        property_doc.insert("createdBy", actor.id.as_str());
        property_doc.insert("agencyId", bson_or_null(actor.agency_id()));
        property_doc.insert("createdAt", now.as_str());

        let mut listing_doc = property_doc.clone();
        listing_doc.insert(PROPERTY_REF, property_id.as_str());

        // One batch, so there is no window where the property exists without
        // its listing.
        self.store
            .batch_write(vec![
                BatchOp::put(PROPERTIES, &property_id, property_doc),
                BatchOp::put(LISTINGS, &property_id, listing_doc),
            ])
            .await
            .inspect_err(|e| {
                error!(%property_id, error = %e, "failed to create property with listing");
            })?;

        info!(%property_id, actor = %actor.id, "created property with listing");
        Ok(property_id)
    }

    /// Delete every listing whose property no longer exists. Full scan, no
    /// cursor: collections here stay in the low thousands. Returns the count
    /// of deleted orphans.
    pub async fn cleanup_orphaned_listings(&self) -> Result<u64> {
        let listings = self.store.query(LISTINGS, &[]).await?;
        let mut removed = 0_u64;

        for listing in &listings {
            let Ok(listing_id) = listing.get_str("id") else {
                continue;
            };
            // A listing without a property reference can never be paired up
            // again, so it counts as orphaned too.
            let orphaned = match listing.get_str(PROPERTY_REF) {
                Ok(property_ref) => self.store.get(PROPERTIES, property_ref).await?.is_none(),
                Err(_) => true,
            };
            if orphaned {
                self.store.delete(LISTINGS, listing_id).await?;
                info!(%listing_id, "deleted orphaned listing");
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Walk every property, reconcile its listing, then sweep orphans.
    /// This is the batch shape of the old maintenance scripts.
    pub async fn sync_all(&self, actor: &Actor) -> Result<SyncReport> {
        let properties = self.store.query(PROPERTIES, &[]).await?;
        let mut report = SyncReport::default();

        for property in properties {
            let Ok(property_id) = property.get_str("id").map(str::to_string) else {
                warn!("skipping property document without an id");
                continue;
            };
            match self
                .sync_property_with_listing(&property_id, property, actor)
                .await?
            {
                SyncOutcome::CreatedListing => report.created += 1,
                SyncOutcome::UpdatedListing => report.updated += 1,
            }
        }

        report.orphans_removed = self.cleanup_orphaned_listings().await?;
        info!(
            created = report.created,
            updated = report.updated,
            orphans_removed = report.orphans_removed,
            "sync pass complete"
        );
        Ok(report)
    }

    /// All listings owned by one agency.
    pub async fn listings_by_agency(&self, agency_id: &str) -> Result<Vec<Listing>> {
        let docs = self
            .store
            .query(LISTINGS, &[("agencyId", Bson::from(agency_id))])
            .await?;
        docs.into_iter()
            .map(|doc| bson::from_document(doc).map_err(Error::from))
            .collect()
    }
}

fn bson_or_null(value: Option<String>) -> Bson {
    value.map_or(Bson::Null, Bson::String)
}

fn stamp_new_listing(mut doc: Document, property_id: &str, actor: &Actor) -> Document {
    doc.insert(PROPERTY_REF, property_id);
    doc.insert("id", property_id);
    doc.insert("status", "active");
    doc.insert("createdBy", actor.id.as_str());
    doc.insert("agencyId", bson_or_null(actor.agency_id()));
    doc.insert("createdAt", now_iso());
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use bson::doc;

    #[tokio::test]
    async fn update_with_unidentifiable_sibling_names_the_property() {
        let service = SyncService::new(Arc::new(MemoryStore::new()));
        let sibling = doc! { PROPERTY_REF: "p1" };
        let err = service
            .update_listing("p1", &sibling, &doc! { "title": "x" })
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::NotFound { ref collection, ref id } if collection == LISTINGS && id == "p1"),
            "unexpected error: {err}"
        );
    }
}
