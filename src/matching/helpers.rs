//! Shared helpers for county-based disambiguation.

/// Case-insensitive substring test of a single county name against a free-text
/// counties field. An empty county never matches.
pub(crate) fn county_in(counties: &str, county: &str) -> bool {
    let county = county.trim();
    if county.is_empty() {
        return false;
    }
    counties.to_lowercase().contains(&county.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_case_insensitive() {
        assert!(county_in("St. Louis County, St. Charles County", "st. louis"));
        assert!(county_in("Cook", "COOK"));
        assert!(!county_in("DuPage", "Cook"));
    }

    #[test]
    fn empty_county_never_matches() {
        assert!(!county_in("Cook", ""));
        assert!(!county_in("Cook", "   "));
        assert!(!county_in("", ""));
    }

    #[test]
    fn substring_policy_is_loose() {
        // "St. Louis City" and "St. Louis County" share the "st. louis" prefix.
        assert!(county_in("St. Louis County", "St. Louis"));
        assert!(!county_in("St Louis County", "St. Louis"));
    }
}
