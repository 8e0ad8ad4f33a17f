//! Geocoding service: reconciles supplied coordinates with the fallback table.
//!
//! Flow:  supplied coordinates valid → original
//!        else fallback lookup on the location string → fallback
//!        else unresolved

use super::fallback::{
    FallbackLookup, FallbackMatch, FallbackTable, MAX_PRECISION_DIGITS, MIN_LOCATION_SEARCH_LENGTH,
};
use super::types::{
    BirthDataWithCoordinates, CoordinateSource, Coordinates, GeocodingError, ParsedCoordinates,
    Resolution, ResolvedCoordinates,
};
use super::validator::{parse_degrees, validate_coordinates};
use tracing::{debug, info, warn};

/// Stateless resolver over a read-only lookup.
#[derive(Debug, Clone, Default)]
pub struct GeocodingService<L = FallbackTable> {
    lookup: L,
}

impl GeocodingService<FallbackTable> {
    /// Service over the compiled-in table.
    pub fn builtin() -> Self {
        Self::new(FallbackTable::builtin())
    }
}

impl<L: FallbackLookup> GeocodingService<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Fallback coordinates for a location string, if any entry matches.
    pub fn find_fallback_coordinates(&self, location: &str) -> Option<FallbackMatch> {
        let found = self.lookup.find_fallback_coordinates(location);
        if let Some(ref m) = found {
            info!(location, description = %m.config.description, "using fallback coordinates");
        }
        found
    }

    /// Pick usable coordinates for the birth data, preferring the supplied pair.
    pub fn process_coordinates(&self, birth: &BirthDataWithCoordinates) -> Resolution {
        debug!(
            location = %birth.location_of_birth,
            lat = %birth.coordinates.lat,
            lon = %birth.coordinates.lon,
            "processing coordinates"
        );

        let original = validate_coordinates(&birth.coordinates);
        if original.is_valid {
            info!(location = %birth.location_of_birth, "using original coordinates");
            return Resolution::Resolved(ResolvedCoordinates {
                coordinates: birth.coordinates.clone(),
                source: CoordinateSource::Original,
                validation_result: original,
                description: None,
                accuracy: None,
            });
        }

        match self.find_fallback_coordinates(&birth.location_of_birth) {
            Some(found) => {
                // The table is trusted but still graded like any other pair.
                let validation_result = validate_coordinates(&found.coordinates);
                Resolution::Resolved(ResolvedCoordinates {
                    coordinates: found.coordinates,
                    source: CoordinateSource::Fallback,
                    validation_result,
                    description: Some(found.config.description),
                    accuracy: Some(found.config.accuracy),
                })
            }
            None => {
                warn!(
                    location = %birth.location_of_birth,
                    errors = ?original.errors,
                    "no valid coordinates available"
                );
                Resolution::Unresolved {
                    location: birth.location_of_birth.clone(),
                    validation_result: original,
                }
            }
        }
    }
}

/// Convert a validated pair to numbers.
pub fn parse_coordinates(coordinates: &Coordinates) -> Result<ParsedCoordinates, GeocodingError> {
    let validation = validate_coordinates(coordinates);
    if !validation.is_valid {
        return Err(GeocodingError::InvalidCoordinates(validation.errors.join(", ")));
    }
    match (parse_degrees(&coordinates.lat), parse_degrees(&coordinates.lon)) {
        (Some(latitude), Some(longitude)) => Ok(ParsedCoordinates { latitude, longitude }),
        _ => Err(GeocodingError::InvalidCoordinates(format!(
            "{}, {}",
            coordinates.lat, coordinates.lon
        ))),
    }
}

/// Build a string pair from numbers, rounded to `MAX_PRECISION_DIGITS`
/// decimal places.
pub fn create_coordinates(latitude: f64, longitude: f64) -> Coordinates {
    Coordinates::new(round_degrees(latitude).to_string(), round_degrees(longitude).to_string())
}

fn round_degrees(value: f64) -> f64 {
    let scale = 10f64.powi(MAX_PRECISION_DIGITS as i32);
    (value * scale).round() / scale
}

/// True when a location string is long enough to be worth looking up.
pub fn is_searchable_location(location: &str) -> bool {
    location.trim().chars().count() >= MIN_LOCATION_SEARCH_LENGTH
}

/// Lowercase, strip everything except word characters, whitespace, `,` `.`
/// and `-`, and collapse runs of whitespace.
pub fn normalize_location_string(location: &str) -> String {
    location
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | ',' | '.' | '-'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::types::{Accuracy, Confidence};
    use approx::assert_relative_eq;
    use std::cell::Cell;

    /// Counts lookups and delegates to the built-in table.
    struct SpyLookup {
        calls: Cell<usize>,
        table: FallbackTable,
    }

    impl FallbackLookup for SpyLookup {
        fn find_fallback_coordinates(&self, location: &str) -> Option<FallbackMatch> {
            self.calls.set(self.calls.get() + 1);
            self.table.find_fallback_coordinates(location)
        }
    }

    fn spy_service() -> GeocodingService<SpyLookup> {
        GeocodingService::new(SpyLookup {
            calls: Cell::new(0),
            table: FallbackTable::builtin(),
        })
    }

    fn birth(location: &str, lat: &str, lon: &str) -> BirthDataWithCoordinates {
        BirthDataWithCoordinates {
            date_of_birth: "1990-01-01".into(),
            time_of_birth: "12:00".into(),
            location_of_birth: location.into(),
            coordinates: Coordinates::new(lat, lon),
        }
    }

    #[test]
    fn test_valid_original_skips_fallback() {
        let service = spy_service();
        let resolution = service.process_coordinates(&birth("Manila, Philippines", "14.5995", "120.9842"));

        let resolved = resolution.resolved().unwrap();
        assert_eq!(resolved.source, CoordinateSource::Original);
        assert_eq!(resolved.coordinates, Coordinates::new("14.5995", "120.9842"));
        assert!(resolved.description.is_none());
        assert!(resolved.accuracy.is_none());
        assert_eq!(service.lookup().calls.get(), 0);
    }

    #[test]
    fn test_empty_coordinates_use_fallback() {
        let service = spy_service();
        let resolved = service
            .process_coordinates(&birth("Zamboanga del Sur, Philippines", "", ""))
            .into_result()
            .unwrap();

        assert_eq!(resolved.source, CoordinateSource::Fallback);
        assert_eq!(resolved.description.as_deref(), Some("Zamboanga del Sur, Philippines"));
        assert_eq!(resolved.accuracy, Some(Accuracy::Region));
        assert_eq!(resolved.coordinates, Coordinates::new("7.3391", "122.0617"));
        assert!(resolved.validation_result.is_valid);
        assert_eq!(resolved.validation_result.confidence, Confidence::High);
        assert_eq!(service.lookup().calls.get(), 1);
    }

    #[test]
    fn test_out_of_range_coordinates_use_fallback() {
        let service = GeocodingService::builtin();
        let resolved = service
            .process_coordinates(&birth("Sydney, Australia", "200", "-200"))
            .into_result()
            .unwrap();
        assert_eq!(resolved.source, CoordinateSource::Fallback);
        assert_eq!(resolved.description.as_deref(), Some("Sydney, Australia"));
    }

    #[test]
    fn test_unresolvable_location() {
        let service = GeocodingService::builtin();
        let resolution = service.process_coordinates(&birth("Unknown City, Unknown Country", "", ""));

        match &resolution {
            Resolution::Unresolved { location, validation_result } => {
                assert_eq!(location, "Unknown City, Unknown Country");
                assert!(!validation_result.is_valid);
            }
            Resolution::Resolved(r) => panic!("expected unresolved, got {:?}", r),
        }

        let err = resolution.into_result().unwrap_err();
        assert!(matches!(err, GeocodingError::Unresolvable { .. }));
        assert!(err.to_string().contains("Unknown City, Unknown Country"));
    }

    #[test]
    fn test_parse_coordinates() {
        let parsed = parse_coordinates(&Coordinates::new("14.5995", "-120.9842")).unwrap();
        assert_relative_eq!(parsed.latitude, 14.5995);
        assert_relative_eq!(parsed.longitude, -120.9842);

        let err = parse_coordinates(&Coordinates::new("", "10")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid coordinates: Latitude is required"));
    }

    #[test]
    fn test_create_coordinates() {
        assert_eq!(create_coordinates(14.5995, 120.9842), Coordinates::new("14.5995", "120.9842"));
        assert_eq!(create_coordinates(-33.0, 151.25), Coordinates::new("-33", "151.25"));
        assert_eq!(
            create_coordinates(14.123456789123, -120.000000004),
            Coordinates::new("14.12345679", "-120")
        );
    }

    #[test]
    fn test_is_searchable_location() {
        assert!(is_searchable_location("Cebu"));
        assert!(is_searchable_location(" USA "));
        assert!(!is_searchable_location("NY"));
        assert!(!is_searchable_location("  "));
    }

    #[test]
    fn test_normalize_location_string() {
        assert_eq!(
            normalize_location_string("  Zamboanga   del Sur,\tPhilippines!! "),
            "zamboanga del sur, philippines"
        );
        assert_eq!(normalize_location_string("St. John's (NL) - Canada"), "st. johns nl - canada");
        assert_eq!(normalize_location_string(""), "");
    }
}
