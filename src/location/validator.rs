//! Coordinate validation and display helpers.
//!
//! Everything here is a pure function over its arguments.

use super::fallback::COORDINATE_TOLERANCE;
use super::service::{normalize_location_string, parse_coordinates};
use super::types::{Confidence, CoordinateValidationResult, Coordinates, PrecisionLevel};

pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Raw strings shorter than this are treated as approximations.
const MIN_PRECISE_LEN: usize = 5;

/// Countries recognized by `extract_country_from_location`, in match order.
const COUNTRY_PATTERNS: &[&str] = &[
    "philippines",
    "united states",
    "usa",
    "canada",
    "united kingdom",
    "uk",
    "australia",
    "germany",
    "france",
    "japan",
    "china",
    "india",
    "brazil",
];

/// Parse a decimal-degree string. Non-finite values (`inf`, `NaN`) are rejected.
pub(crate) fn parse_degrees(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Check that a coordinate pair is usable and grade how far to trust it.
pub fn validate_coordinates(coordinates: &Coordinates) -> CoordinateValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let lat_raw = coordinates.lat.trim();
    let lon_raw = coordinates.lon.trim();

    if lat_raw.is_empty() {
        errors.push("Latitude is required and cannot be empty".to_string());
    }
    if lon_raw.is_empty() {
        errors.push("Longitude is required and cannot be empty".to_string());
    }
    if !errors.is_empty() {
        return invalid(errors, warnings);
    }

    let lat = parse_degrees(lat_raw);
    let lon = parse_degrees(lon_raw);
    if lat.is_none() {
        errors.push(format!("Invalid latitude format: {}", coordinates.lat));
    }
    if lon.is_none() {
        errors.push(format!("Invalid longitude format: {}", coordinates.lon));
    }
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return invalid(errors, warnings),
    };

    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        errors.push(format!("Latitude out of range (-90 to 90): {}", lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        errors.push(format!("Longitude out of range (-180 to 180): {}", lon));
    }

    let mut confidence = Confidence::High;

    // Null Island is almost always a failed geocode.
    if lat == 0.0 && lon == 0.0 {
        warnings.push("Coordinates at 0,0 might indicate geocoding error".to_string());
        confidence = Confidence::Medium;
    }

    // Untrimmed lengths, as typed.
    if coordinates.lat.chars().count() < MIN_PRECISE_LEN
        || coordinates.lon.chars().count() < MIN_PRECISE_LEN
    {
        warnings.push("Low precision coordinates detected".to_string());
        confidence = confidence.min(Confidence::Medium);
    }

    if !errors.is_empty() {
        return invalid(errors, warnings);
    }

    CoordinateValidationResult {
        is_valid: true,
        errors,
        warnings,
        confidence,
    }
}

fn invalid(errors: Vec<String>, warnings: Vec<String>) -> CoordinateValidationResult {
    CoordinateValidationResult {
        is_valid: false,
        errors,
        warnings,
        confidence: Confidence::Low,
    }
}

/// True when both pairs parse and each component differs by less than
/// `COORDINATE_TOLERANCE` degrees.
pub fn are_similar_coordinates(a: &Coordinates, b: &Coordinates) -> bool {
    let parsed = (
        parse_degrees(&a.lat),
        parse_degrees(&a.lon),
        parse_degrees(&b.lat),
        parse_degrees(&b.lon),
    );
    match parsed {
        (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => {
            (lat1 - lat2).abs() < COORDINATE_TOLERANCE && (lon1 - lon2).abs() < COORDINATE_TOLERANCE
        }
        _ => false,
    }
}

/// Render as `14.5995°N, 120.9842°E`.
pub fn format_coordinates_for_display(coordinates: &Coordinates) -> String {
    match parse_coordinates(coordinates) {
        Ok(parsed) => {
            let lat_dir = if parsed.latitude >= 0.0 { 'N' } else { 'S' };
            let lon_dir = if parsed.longitude >= 0.0 { 'E' } else { 'W' };
            format!(
                "{:.4}\u{00B0}{}, {:.4}\u{00B0}{}",
                parsed.latitude.abs(),
                lat_dir,
                parsed.longitude.abs(),
                lon_dir
            )
        }
        Err(_) => "Invalid coordinates".to_string(),
    }
}

/// Best-effort country guess from a free-text location.
///
/// Known country names win; otherwise the last comma-separated segment is
/// returned if it is longer than two characters.
pub fn extract_country_from_location(location: &str) -> Option<String> {
    let normalized = normalize_location_string(location);
    if normalized.is_empty() {
        return None;
    }

    for country in COUNTRY_PATTERNS {
        if normalized.contains(country) {
            let canonical = if *country == "usa" { "united states" } else { country };
            return Some(canonical.to_string());
        }
    }

    let parts: Vec<&str> = location.split(',').map(str::trim).collect();
    if parts.len() > 1 {
        let last = normalize_location_string(parts[parts.len() - 1]);
        if last.chars().count() > 2 {
            return Some(last);
        }
    }

    None
}

// ─── Precision ──────────────────────────────────────────────────

fn decimal_digits(raw: &str) -> usize {
    let mantissa = raw.trim().split(['e', 'E']).next().unwrap_or("");
    match mantissa.split_once('.') {
        Some((_, frac)) => frac.chars().take_while(|c| c.is_ascii_digit()).count(),
        None => 0,
    }
}

/// Grade by the smaller decimal-digit count of the two components:
/// 4+ is high (about 11 m), 2+ is medium, anything less is low.
pub fn precision_level(coordinates: &Coordinates) -> PrecisionLevel {
    let digits = decimal_digits(&coordinates.lat).min(decimal_digits(&coordinates.lon));
    match digits {
        d if d >= 4 => PrecisionLevel::High,
        d if d >= 2 => PrecisionLevel::Medium,
        _ => PrecisionLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: &str, lon: &str) -> Coordinates {
        Coordinates::new(lat, lon)
    }

    #[test]
    fn test_valid_coordinates() {
        let result = validate_coordinates(&coords("14.5995", "120.9842"));
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_range_grid_is_valid() {
        for lat in [-90.0, -45.5, 0.0001, 37.7749, 89.9999, 90.0] {
            for lon in [-180.0, -0.5, 0.0001, 120.25, 179.9999, 180.0] {
                let (lat, lon) = (format!("{:.4}", lat), format!("{:.4}", lon));
                let result = validate_coordinates(&coords(&lat, &lon));
                assert!(result.is_valid, "{}, {} should be valid: {:?}", lat, lon, result.errors);
                assert_eq!(result.confidence, Confidence::High, "{}, {}", lat, lon);
            }
        }
    }

    #[test]
    fn test_just_outside_range_is_invalid() {
        for lat in ["-90.0001", "90.0001"] {
            let result = validate_coordinates(&coords(lat, "120.9842"));
            assert!(!result.is_valid, "{} should be rejected", lat);
            assert_eq!(result.errors.len(), 1);
            assert!(result.errors[0].starts_with("Latitude out of range"));
        }
        for lon in ["-180.0001", "180.0001"] {
            let result = validate_coordinates(&coords("14.5995", lon));
            assert!(!result.is_valid, "{} should be rejected", lon);
            assert_eq!(result.errors.len(), 1);
            assert!(result.errors[0].starts_with("Longitude out of range"));
        }
    }

    #[test]
    fn test_empty_coordinates() {
        let result = validate_coordinates(&coords("", "  "));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("Latitude"));
        assert!(result.errors[1].contains("Longitude"));
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_unparseable_coordinates() {
        let result = validate_coordinates(&coords("north", "120.9842"));
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Invalid latitude format: north".to_string()]);

        let result = validate_coordinates(&coords("14.5995", "inf"));
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("longitude"));
    }

    #[test]
    fn test_out_of_range_names_field() {
        let result = validate_coordinates(&coords("200", "-200"));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].starts_with("Latitude out of range"));
        assert!(result.errors[1].starts_with("Longitude out of range"));
        assert_eq!(result.confidence, Confidence::Low);

        let result = validate_coordinates(&coords("45.00000", "180.00001"));
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("Longitude"));
    }

    #[test]
    fn test_null_island_warns() {
        let result = validate_coordinates(&coords("0", "0"));
        assert!(result.is_valid);
        assert!(!result.warnings.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("0,0")));
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[test]
    fn test_low_precision_downgrades_to_medium() {
        let result = validate_coordinates(&coords("14.5", "120.9842"));
        assert!(result.is_valid);
        assert_eq!(result.warnings, vec!["Low precision coordinates detected".to_string()]);
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[test]
    fn test_precision_counts_untrimmed_length() {
        let result = validate_coordinates(&coords(" 14.5", "120.9842"));
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_similar_coordinates() {
        assert!(are_similar_coordinates(
            &coords("10.00001", "20.00001"),
            &coords("10.00002", "20.00002"),
        ));
        assert!(!are_similar_coordinates(&coords("10.0", "20.0"), &coords("10.1", "20.0")));
        assert!(!are_similar_coordinates(&coords("", "20.0"), &coords("10.0", "20.0")));
    }

    #[test]
    fn test_format_for_display() {
        assert_eq!(
            format_coordinates_for_display(&coords("14.5995", "120.9842")),
            "14.5995\u{00B0}N, 120.9842\u{00B0}E"
        );
        assert_eq!(
            format_coordinates_for_display(&coords("-33.8688", "-74.006")),
            "33.8688\u{00B0}S, 74.0060\u{00B0}W"
        );
        assert_eq!(format_coordinates_for_display(&coords("", "")), "Invalid coordinates");
        assert_eq!(format_coordinates_for_display(&coords("95", "10")), "Invalid coordinates");
    }

    #[test]
    fn test_extract_country_known_names() {
        assert_eq!(
            extract_country_from_location("Cebu City, Philippines"),
            Some("philippines".to_string())
        );
        assert_eq!(
            extract_country_from_location("Austin, TX, USA"),
            Some("united states".to_string())
        );
    }

    #[test]
    fn test_extract_country_last_segment() {
        assert_eq!(
            extract_country_from_location("Lyon, Auvergne, Belgique"),
            Some("belgique".to_string())
        );
        assert_eq!(extract_country_from_location("Somewhere, XY"), None);
        assert_eq!(extract_country_from_location("Atlantis"), None);
        assert_eq!(extract_country_from_location(""), None);
    }

    #[test]
    fn test_precision_level() {
        assert_eq!(precision_level(&coords("14", "120")), PrecisionLevel::Low);
        assert_eq!(precision_level(&coords("14.59", "120.984")), PrecisionLevel::Medium);
        assert_eq!(precision_level(&coords("14.5995123", "120.9842456")), PrecisionLevel::High);
    }
}
