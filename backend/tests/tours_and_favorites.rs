use std::sync::Arc;

use bson::doc;

use okinawanow_backend::favorites::{FavoriteService, FAVORITES};
use okinawanow_backend::models::TourStatus;
use okinawanow_backend::store::{DocumentStore, MemoryStore};
use okinawanow_backend::sync::LISTINGS;
use okinawanow_backend::tours::{TourRequester, TourService, TOUR_REQUESTS};
use okinawanow_backend::Error;

fn requester(user_id: &str) -> TourRequester {
    TourRequester {
        user_id: user_id.to_string(),
        user_name: "Jordan".to_string(),
        user_email: format!("{user_id}@example.com"),
        phone: None,
    }
}

async fn store_with_listing(listing_id: &str, agency_id: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .put(
            LISTINGS,
            listing_id,
            doc! {
                "title": "Seaside 2LDK",
                "location": "Chatan",
                "agencyId": agency_id,
            },
        )
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn tour_request_snapshots_the_listing() {
    let store = store_with_listing("l1", "a1").await;
    let tours = TourService::new(store.clone() as Arc<dyn DocumentStore>);

    let tour = tours
        .request_tour("l1", &requester("u1"), "I would like to schedule a tour.")
        .await
        .unwrap();

    assert!(tour.id.starts_with("l1_u1_"));
    assert_eq!(tour.status, TourStatus::Pending);
    assert_eq!(tour.listing_title, "Seaside 2LDK");
    assert_eq!(tour.listing_location, "Chatan");

    let stored = store.get(TOUR_REQUESTS, &tour.id).await.unwrap().unwrap();
    assert_eq!(stored.get_str("userEmail").unwrap(), "u1@example.com");
}

#[tokio::test]
async fn tour_request_requires_a_live_listing() {
    let store = Arc::new(MemoryStore::new());
    let tours = TourService::new(store as Arc<dyn DocumentStore>);
    let err = tours
        .request_tour("missing", &requester("u1"), "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn pending_tours_can_be_approved_but_not_reopened() {
    let store = store_with_listing("l1", "a1").await;
    let tours = TourService::new(store as Arc<dyn DocumentStore>);

    let tour = tours
        .request_tour("l1", &requester("u1"), "hello")
        .await
        .unwrap();

    let approved = tours
        .update_status(&tour.id, TourStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, TourStatus::Approved);

    // Approved is terminal; the renter cannot cancel it afterwards.
    let err = tours
        .update_status(&tour.id, TourStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: TourStatus::Approved,
            to: TourStatus::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn pending_is_not_a_legal_transition_target() {
    let store = store_with_listing("l1", "a1").await;
    let tours = TourService::new(store as Arc<dyn DocumentStore>);

    let tour = tours
        .request_tour("l1", &requester("u1"), "hello")
        .await
        .unwrap();
    let err = tours
        .update_status(&tour.id, TourStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            to: TourStatus::Pending,
            ..
        }
    ));
}

#[tokio::test]
async fn renters_can_cancel_their_pending_tour() {
    let store = store_with_listing("l1", "a1").await;
    let tours = TourService::new(store as Arc<dyn DocumentStore>);

    let tour = tours
        .request_tour("l1", &requester("u1"), "hello")
        .await
        .unwrap();
    let cancelled = tours
        .update_status(&tour.id, TourStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, TourStatus::Cancelled);
}

#[tokio::test]
async fn tours_are_listed_per_user_and_per_agency() {
    let store = store_with_listing("l1", "a1").await;
    store
        .put(LISTINGS, "l2", doc! { "title": "Hilltop", "location": "Yomitan", "agencyId": "a2" })
        .await
        .unwrap();
    let tours = TourService::new(store as Arc<dyn DocumentStore>);

    tours.request_tour("l1", &requester("u1"), "one").await.unwrap();
    tours.request_tour("l2", &requester("u1"), "two").await.unwrap();
    tours.request_tour("l1", &requester("u2"), "three").await.unwrap();

    let for_user = tours.tours_for_user("u1").await.unwrap();
    assert_eq!(for_user.len(), 2);
    assert!(for_user.iter().all(|t| t.user_id == "u1"));

    let for_agency = tours.tours_for_agency("a1").await.unwrap();
    assert_eq!(for_agency.len(), 2);
    assert!(for_agency.iter().all(|t| t.listing_id == "l1"));
}

#[tokio::test]
async fn favorite_toggle_creates_and_hard_deletes() {
    let store = Arc::new(MemoryStore::new());
    let favorites = FavoriteService::new(store.clone() as Arc<dyn DocumentStore>);

    assert!(favorites.toggle("u1", "l1").await.unwrap());
    assert!(favorites.is_favorited("u1", "l1").await.unwrap());
    assert_eq!(store.len(FAVORITES).await, 1);

    assert!(!favorites.toggle("u1", "l1").await.unwrap());
    assert!(!favorites.is_favorited("u1", "l1").await.unwrap());
    assert_eq!(store.len(FAVORITES).await, 0);
}

#[tokio::test]
async fn favorites_list_only_the_users_listings() {
    let store = Arc::new(MemoryStore::new());
    let favorites = FavoriteService::new(store as Arc<dyn DocumentStore>);

    favorites.toggle("u1", "l1").await.unwrap();
    favorites.toggle("u1", "l2").await.unwrap();
    favorites.toggle("u2", "l3").await.unwrap();

    let mut listing_ids = favorites.favorites_for_user("u1").await.unwrap();
    listing_ids.sort();
    assert_eq!(listing_ids, vec!["l1".to_string(), "l2".to_string()]);
}
