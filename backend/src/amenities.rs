//! Read-side normalization of the two legal amenity shapes into the single
//! categorized view the listing pages render. Pure, no I/O, never fails:
//! a record with nothing to show yields `None` so callers can skip the
//! whole section.

use crate::models::{Amenities, CategorizedAmenities};

/// One rendered amenity section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmenityGroup {
    pub label: String,
    pub items: Vec<String>,
}

/// Known categories in display order, with their display labels.
const CATEGORY_LABELS: [(&str, &str); 7] = [
    ("interior", "Interior"),
    ("bathroom", "Bathroom"),
    ("kitchen", "Kitchen"),
    ("building", "Building"),
    ("utility", "Utilities"),
    ("security", "Security"),
    ("location", "Location"),
];

/// Assemble the view model for a listing's amenities.
///
/// A flat list becomes a single "Amenities" group. A categorized map is
/// emitted in the fixed category order above, empty categories dropped, and
/// any category key this version does not know about is passed through after
/// the known ones, in input order, labeled by its raw key.
pub fn assemble_amenities(amenities: &Amenities) -> Option<Vec<AmenityGroup>> {
    match amenities {
        Amenities::Flat(items) => {
            if items.is_empty() {
                return None;
            }
            Some(vec![AmenityGroup {
                label: "Amenities".to_string(),
                items: items.clone(),
            }])
        }
        Amenities::Categorized(categorized) => {
            let mut groups = Vec::new();
            for (key, label) in CATEGORY_LABELS {
                let items = known_category(categorized, key);
                if let Some(items) = items {
                    if !items.is_empty() {
                        groups.push(AmenityGroup {
                            label: label.to_string(),
                            items: items.clone(),
                        });
                    }
                }
            }
            for (key, value) in &categorized.extra {
                let items = string_items(value);
                if !items.is_empty() {
                    groups.push(AmenityGroup {
                        label: key.clone(),
                        items,
                    });
                }
            }
            if groups.is_empty() {
                None
            } else {
                Some(groups)
            }
        }
    }
}

fn known_category<'a>(categorized: &'a CategorizedAmenities, key: &str) -> Option<&'a Vec<String>> {
    match key {
        "interior" => categorized.interior.as_ref(),
        "bathroom" => categorized.bathroom.as_ref(),
        "kitchen" => categorized.kitchen.as_ref(),
        "building" => categorized.building.as_ref(),
        "utility" => categorized.utility.as_ref(),
        "security" => categorized.security.as_ref(),
        "location" => categorized.location.as_ref(),
        _ => None,
    }
}

// Unknown categories arrive as raw JSON; anything that is not a string is
// skipped rather than failing the whole assembly.
fn string_items(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(values) => values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
