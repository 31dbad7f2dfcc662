use serde::{Deserialize, Serialize};
use std::fmt;

// Field names follow the document shapes already stored in production
// (camelCase), so every struct here round-trips through the store without a
// rename layer.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    House,
    Apartment,
    Condo,
    Townhouse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Pending,
    Inactive,
    Rented,
}

/// Amenities were written by two generations of the product: older documents
/// carry a flat list of strings, newer ones a categorized map. Both are legal
/// on read; the ambiguity stops here at the deserialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amenities {
    Flat(Vec<String>),
    Categorized(CategorizedAmenities),
}

/// The seven known amenity categories. Categories this version does not know
/// about land in `extra` and are carried through untouched, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedAmenities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interior: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathroom: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kitchen: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Canonical rental unit. `price` is in yen, no decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub city: String,
    pub price: i64,
    #[serde(default)]
    pub negotiable: bool,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub floor_area: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub listing_type: ListingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    // Kept as an explicit null for non-agency owners, matching stored documents.
    #[serde(default)]
    pub agency_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Amenities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TourStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl TourStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourStatus::Pending => "pending",
            TourStatus::Approved => "approved",
            TourStatus::Rejected => "rejected",
            TourStatus::Cancelled => "cancelled",
        }
    }

    /// Approved, rejected and cancelled requests admit no further transition.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TourStatus::Pending)
    }
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A renter's request to view a listing, with a snapshot of the requester's
/// contact details and the listing's headline fields at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourRequest {
    pub id: String,
    pub listing_id: String,
    pub listing_title: String,
    pub listing_location: String,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
    pub status: TourStatus,
    pub created_at: String,
}

/// Join document between a user and a listing, keyed `{userId}_{listingId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: String,
    pub user_id: String,
    pub listing_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agency,
    Admin,
}

/// Identity attributed to a write, as asserted by the auth provider. The core
/// stamps ownership from it and performs no authorization of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Actor {
            id: id.into(),
            role,
        }
    }

    /// Agency-owned writes are stamped with the agency's own id.
    pub fn agency_id(&self) -> Option<String> {
        match self.role {
            Role::Agency => Some(self.id.clone()),
            Role::User | Role::Admin => None,
        }
    }
}
