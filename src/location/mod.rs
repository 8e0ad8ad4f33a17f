//! Location resolution for birth and event data.
//!
//! Validates supplied coordinates, falls back to a built-in keyword table,
//! and reports where the final coordinates came from.

pub mod fallback;
pub mod service;
pub mod types;
pub mod validator;

pub use fallback::{
    ConfigurationCheck, ConfigurationStats, FallbackLocation, FallbackLookup, FallbackMatch,
    FallbackTable, MIN_LOCATION_SEARCH_LENGTH,
};
pub use service::{
    create_coordinates, is_searchable_location, normalize_location_string, parse_coordinates,
    GeocodingService,
};
pub use types::{
    Accuracy, BirthDataWithCoordinates, Confidence, CoordinateSource, CoordinateValidationResult,
    Coordinates, GeocodingError, ParsedCoordinates, PrecisionLevel, Resolution, ResolvedCoordinates,
};
pub use validator::{
    are_similar_coordinates, extract_country_from_location, format_coordinates_for_display,
    precision_level, validate_coordinates,
};
