//! Tour-request workflow: a renter asks to view a listing, the owning agency
//! approves or rejects it, the renter can cancel while it is still pending.

use std::sync::Arc;

use bson::Bson;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::models::{TourRequest, TourStatus};
use crate::store::DocumentStore;
use crate::sync::{now_iso, LISTINGS};

pub const TOUR_REQUESTS: &str = "tourRequests";

/// Contact snapshot taken from the requesting user at submission time.
#[derive(Debug, Clone)]
pub struct TourRequester {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct TourService {
    store: Arc<dyn DocumentStore>,
}

impl TourService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        TourService { store }
    }

    /// Submit a tour request for a listing. The id is
    /// `{listingId}_{userId}_{millis}`; two submissions by the same user for
    /// the same listing within one millisecond collide, which is accepted as
    /// negligible at this traffic.
    pub async fn request_tour(
        &self,
        listing_id: &str,
        requester: &TourRequester,
        message: &str,
    ) -> Result<TourRequest> {
        let listing = self
            .store
            .get(LISTINGS, listing_id)
            .await?
            .ok_or_else(|| Error::not_found(LISTINGS, listing_id))?;

        let tour_id = format!(
            "{listing_id}_{}_{}",
            requester.user_id,
            chrono::Utc::now().timestamp_millis()
        );
        let tour = TourRequest {
            id: tour_id.clone(),
            listing_id: listing_id.to_string(),
            listing_title: listing.get_str("title").unwrap_or_default().to_string(),
            listing_location: listing.get_str("location").unwrap_or_default().to_string(),
            user_id: requester.user_id.clone(),
            user_name: requester.user_name.clone(),
            user_email: requester.user_email.clone(),
            phone: requester.phone.clone(),
            message: message.to_string(),
            status: TourStatus::Pending,
            created_at: now_iso(),
        };

        let doc = bson::to_document(&tour)?;
        self.store.put(TOUR_REQUESTS, &tour_id, doc).await?;
        info!(%tour_id, %listing_id, "tour requested");
        Ok(tour)
    }

    pub async fn tours_for_user(&self, user_id: &str) -> Result<Vec<TourRequest>> {
        let docs = self
            .store
            .query(TOUR_REQUESTS, &[("userId", Bson::from(user_id))])
            .await?;
        docs.into_iter()
            .map(|doc| bson::from_document(doc).map_err(Error::from))
            .collect()
    }

    /// Tour requests for every listing an agency owns. The store only does
    /// equality filters, so this fans out one query per listing.
    pub async fn tours_for_agency(&self, agency_id: &str) -> Result<Vec<TourRequest>> {
        let listings = self
            .store
            .query(LISTINGS, &[("agencyId", Bson::from(agency_id))])
            .await?;

        let mut tours = Vec::new();
        for listing in &listings {
            let Ok(listing_id) = listing.get_str("id") else {
                continue;
            };
            let docs = self
                .store
                .query(TOUR_REQUESTS, &[("listingId", Bson::from(listing_id))])
                .await?;
            for doc in docs {
                tours.push(bson::from_document(doc)?);
            }
        }
        Ok(tours)
    }

    /// Move a pending request to approved, rejected or cancelled. Terminal
    /// states are final and pending is never a legal target. The web tier
    /// decides who may transition (agency approves/rejects, the requesting
    /// renter cancels); only the state machine is enforced here.
    pub async fn update_status(&self, tour_id: &str, new_status: TourStatus) -> Result<TourRequest> {
        let doc = self
            .store
            .get(TOUR_REQUESTS, tour_id)
            .await?
            .ok_or_else(|| Error::not_found(TOUR_REQUESTS, tour_id))?;
        let mut tour: TourRequest = bson::from_document(doc)?;

        if tour.status.is_terminal() || new_status == TourStatus::Pending {
            error!(%tour_id, from = %tour.status, to = %new_status, "illegal tour transition");
            return Err(Error::InvalidTransition {
                id: tour_id.to_string(),
                from: tour.status,
                to: new_status,
            });
        }

        self.store
            .patch(
                TOUR_REQUESTS,
                tour_id,
                bson::doc! { "status": new_status.as_str() },
            )
            .await?;
        info!(%tour_id, status = new_status.as_str(), "tour status updated");
        tour.status = new_status;
        Ok(tour)
    }
}
