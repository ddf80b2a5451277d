//! Trucking-domain relevance filter

use tracing::debug;

/// Keywords marking a message as logistics-related
///
/// Matching is case-insensitive substring search with no token boundaries,
/// so the generic `id` term also hits words like "holiday". Known
/// imprecision, kept from the reference filter.
pub const TRUCKING_KEYWORDS: &[&str] = &[
    "shipment",
    "delivery",
    "truck",
    "freight",
    "cargo",
    "load",
    "transport",
    "shipping",
    "carrier",
    "destination",
    "origin",
    "pickup",
    "route",
    "dispatch",
    "logistics",
    "pallet",
    "warehouse",
    "dock",
    "tracking",
    "id",
    "eta",
    "arrival",
    "departure",
    "weight",
    "consignment",
];

/// Keywords present in `body`
pub fn matched_keywords(body: &str) -> Vec<&'static str> {
    if body.is_empty() {
        return Vec::new();
    }
    let lower = body.to_lowercase();
    TRUCKING_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lower.contains(keyword))
        .collect()
}

/// True when the body mentions at least one trucking keyword
pub fn is_relevant(body: &str) -> bool {
    let found = matched_keywords(body);
    if found.is_empty() {
        debug!("no trucking-related keywords found in email");
        false
    } else {
        debug!(keywords = ?found, "found trucking-related keywords");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_irrelevant() {
        assert!(!is_relevant(""));
    }

    #[test]
    fn test_relevant_body() {
        assert!(is_relevant("shipment ETA tomorrow"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_relevant("FREIGHT Quote Attached"));
    }

    #[test]
    fn test_unrelated_body() {
        assert!(!is_relevant("lunch menu for next week"));
    }

    #[test]
    fn test_substring_imprecision_is_kept() {
        // "id" matches inside "holiday" — documented behavior of the filter
        assert!(is_relevant("office holiday schedule"));
        let found = matched_keywords("office holiday schedule");
        assert_eq!(found, vec!["id"]);
    }

    #[test]
    fn test_multiple_keywords_reported() {
        let found = matched_keywords("The cargo left the warehouse dock.");
        assert!(found.contains(&"cargo"));
        assert!(found.contains(&"warehouse"));
        assert!(found.contains(&"dock"));
    }
}
