//! Fallback location table: approximate coordinates for well-known places,
//! matched by keywords against a free-text location.

use super::types::{Accuracy, Coordinates, GeocodingError};
use super::validator::{parse_degrees, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Component tolerance, in degrees, for `are_similar_coordinates`.
pub const COORDINATE_TOLERANCE: f64 = 0.0001;

/// Maximum precision digits kept for coordinates.
pub const MAX_PRECISION_DIGITS: usize = 8;

/// Minimum query length before a location search is worth running.
pub const MIN_LOCATION_SEARCH_LENGTH: usize = 3;

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinLocation {
    keywords: &'static [&'static str],
    lat: &'static str,
    lon: &'static str,
    description: &'static str,
    priority: i32,
    accuracy: Accuracy,
}

// Narrow entries must outrank the broader entries whose keywords they contain.
const BUILTIN_LOCATIONS: &[BuiltinLocation] = &[
    // Philippines, specific regions
    BuiltinLocation {
        keywords: &["zamboanga del sur", "philippines"],
        lat: "7.3391", lon: "122.0617",
        description: "Zamboanga del Sur, Philippines",
        priority: 100, accuracy: Accuracy::Region,
    },
    BuiltinLocation {
        keywords: &["zamboanga", "philippines"],
        lat: "6.9214", lon: "122.0790",
        description: "Zamboanga Region, Philippines",
        priority: 90, accuracy: Accuracy::Region,
    },
    BuiltinLocation {
        keywords: &["cebu", "philippines"],
        lat: "10.3157", lon: "123.8854",
        description: "Cebu, Philippines",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["davao", "philippines"],
        lat: "7.1907", lon: "125.4553",
        description: "Davao, Philippines",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["quezon city", "philippines"],
        lat: "14.6760", lon: "121.0437",
        description: "Quezon City, Philippines",
        priority: 85, accuracy: Accuracy::City,
    },
    // Philippines, general
    BuiltinLocation {
        keywords: &["manila", "philippines"],
        lat: "14.5995", lon: "120.9842",
        description: "Manila, Philippines",
        priority: 80, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["philippines"],
        lat: "12.8797", lon: "121.7740",
        description: "Philippines (geographic center)",
        priority: 70, accuracy: Accuracy::Country,
    },
    // United States
    BuiltinLocation {
        keywords: &["new york", "ny", "united states"],
        lat: "40.7128", lon: "-74.0060",
        description: "New York, NY, USA",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["los angeles", "la", "california", "united states"],
        lat: "34.0522", lon: "-118.2437",
        description: "Los Angeles, CA, USA",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["chicago", "illinois", "united states"],
        lat: "41.8781", lon: "-87.6298",
        description: "Chicago, IL, USA",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["san francisco", "california", "united states"],
        lat: "37.7749", lon: "-122.4194",
        description: "San Francisco, CA, USA",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["united states", "usa"],
        lat: "39.8283", lon: "-98.5795",
        description: "United States (geographic center)",
        priority: 70, accuracy: Accuracy::Country,
    },
    // Other countries
    BuiltinLocation {
        keywords: &["london", "united kingdom", "uk"],
        lat: "51.5074", lon: "-0.1278",
        description: "London, United Kingdom",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["united kingdom", "uk"],
        lat: "55.3781", lon: "-3.4360",
        description: "United Kingdom (center)",
        priority: 70, accuracy: Accuracy::Country,
    },
    BuiltinLocation {
        keywords: &["toronto", "canada"],
        lat: "43.6532", lon: "-79.3832",
        description: "Toronto, Canada",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["canada"],
        lat: "56.1304", lon: "-106.3468",
        description: "Canada (geographic center)",
        priority: 70, accuracy: Accuracy::Country,
    },
    BuiltinLocation {
        keywords: &["sydney", "australia"],
        lat: "-33.8688", lon: "151.2093",
        description: "Sydney, Australia",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["australia"],
        lat: "-25.2744", lon: "133.7751",
        description: "Australia (center)",
        priority: 70, accuracy: Accuracy::Country,
    },
    BuiltinLocation {
        keywords: &["tokyo", "japan"],
        lat: "35.6762", lon: "139.6503",
        description: "Tokyo, Japan",
        priority: 85, accuracy: Accuracy::City,
    },
    BuiltinLocation {
        keywords: &["japan"],
        lat: "36.2048", lon: "138.2529",
        description: "Japan (center)",
        priority: 70, accuracy: Accuracy::Country,
    },
];

// ─── Table ──────────────────────────────────────────────────────

/// One row of the fallback table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackLocation {
    /// Lowercase keywords; every one must occur in the location string.
    pub keywords: Vec<String>,
    pub lat: String,
    pub lon: String,
    pub description: String,
    /// Higher wins when several entries match.
    pub priority: i32,
    pub accuracy: Accuracy,
}

impl FallbackLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat.clone(), self.lon.clone())
    }

    /// True when every input matching `other` also matches `self`: each of
    /// our keywords occurs inside one of `other`'s keywords.
    fn covers(&self, other: &FallbackLocation) -> bool {
        self.keywords.iter().any(|k| !k.is_empty())
            && self
                .keywords
                .iter()
                .all(|k| other.keywords.iter().any(|o| o.contains(k.as_str())))
    }

    /// True when `FallbackTable::new` orders `self` before `other`. Equal
    /// keyword counts at equal priority fall back to authoring order, which
    /// is counted as outranking either way.
    fn outranks(&self, other: &FallbackLocation) -> bool {
        self.priority > other.priority
            || (self.priority == other.priority && self.keywords.len() >= other.keywords.len())
    }

    fn matches(&self, normalized: &str) -> bool {
        self.keywords
            .iter()
            .all(|k| normalized.contains(k.to_lowercase().as_str()))
    }
}

impl From<&BuiltinLocation> for FallbackLocation {
    fn from(b: &BuiltinLocation) -> Self {
        Self {
            keywords: b.keywords.iter().map(|k| k.to_string()).collect(),
            lat: b.lat.to_string(),
            lon: b.lon.to_string(),
            description: b.description.to_string(),
            priority: b.priority,
            accuracy: b.accuracy,
        }
    }
}

/// A table hit: the coordinates to use and the entry that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackMatch {
    pub coordinates: Coordinates,
    pub config: FallbackLocation,
}

/// Result of `FallbackTable::validate_configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationCheck {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Summary counts for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationStats {
    pub total_locations: usize,
    pub cities_count: usize,
    pub regions_count: usize,
    pub countries_count: usize,
    pub average_priority: i64,
}

/// Something that can map a free-text location to approximate coordinates.
///
/// The keyword table is the only implementation today; a network geocoder
/// can sit behind the same contract.
pub trait FallbackLookup {
    fn find_fallback_coordinates(&self, location: &str) -> Option<FallbackMatch>;
}

/// Immutable fallback table, sorted by descending priority at construction.
#[derive(Debug, Clone)]
pub struct FallbackTable {
    locations: Vec<FallbackLocation>,
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FallbackTable {
    /// The compiled-in table.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_LOCATIONS.iter().map(FallbackLocation::from).collect())
    }

    /// Build a table from arbitrary entries. Entries are ordered by priority
    /// (descending), then by keyword count (descending); the sort is stable so
    /// remaining ties keep authoring order.
    pub fn new(mut locations: Vec<FallbackLocation>) -> Self {
        for loc in &mut locations {
            for k in &mut loc.keywords {
                *k = k.trim().to_lowercase();
            }
        }
        locations.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.keywords.len().cmp(&a.keywords.len()))
        });
        Self { locations }
    }

    /// Parse a JSON array of entries.
    pub fn from_json_str(json: &str) -> Result<Self, GeocodingError> {
        let locations: Vec<FallbackLocation> = serde_json::from_str(json)?;
        Ok(Self::new(locations))
    }

    /// Read a JSON table from disk.
    pub fn from_path(path: &Path) -> Result<Self, GeocodingError> {
        let data = fs::read_to_string(path).map_err(|source| GeocodingError::TableRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    /// Read a JSON table and reject it unless `validate_configuration` passes.
    pub fn load_checked(path: &Path) -> Result<Self, GeocodingError> {
        let table = Self::from_path(path)?;
        let check = table.validate_configuration();
        if check.is_valid {
            Ok(table)
        } else {
            Err(GeocodingError::InvalidTable(check.errors))
        }
    }

    /// Entries in match order.
    pub fn locations(&self) -> &[FallbackLocation] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// First entry, in priority order, whose keywords all occur in the
    /// lowercased, trimmed location. `None` is an ordinary outcome.
    pub fn find(&self, location: &str) -> Option<&FallbackLocation> {
        let normalized = location.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.locations.iter().find(|loc| loc.matches(&normalized))
    }

    /// Entries with at least one keyword containing `keyword`.
    pub fn fallback_locations_by_keyword(&self, keyword: &str) -> Vec<&FallbackLocation> {
        let needle = keyword.trim().to_lowercase();
        self.locations
            .iter()
            .filter(|loc| loc.keywords.iter().any(|k| k.contains(needle.as_str())))
            .collect()
    }

    /// Sorted country/region keywords; short tokens and city names are skipped.
    pub fn supported_regions(&self) -> Vec<String> {
        let regions: BTreeSet<&str> = self
            .locations
            .iter()
            .flat_map(|loc| loc.keywords.iter())
            .filter(|k| k.chars().count() > 3 && !k.contains(" city"))
            .map(String::as_str)
            .collect();
        regions.into_iter().map(str::to_string).collect()
    }

    /// Check the table for authoring mistakes. Meant for startup or CI, not
    /// per request.
    pub fn validate_configuration(&self) -> ConfigurationCheck {
        let mut errors = Vec::new();

        // Duplicate coordinate pairs
        let mut by_coords: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for loc in &self.locations {
            by_coords
                .entry(format!("{},{}", loc.lat.trim(), loc.lon.trim()))
                .or_default()
                .push(&loc.description);
        }
        for (coord, descriptions) in &by_coords {
            if descriptions.len() > 1 {
                errors.push(format!(
                    "Duplicate coordinates {} found in: {}",
                    coord,
                    descriptions.join(", ")
                ));
            }
        }

        // Coordinate values
        for loc in &self.locations {
            match (parse_degrees(&loc.lat), parse_degrees(&loc.lon)) {
                (Some(lat), Some(lon)) => {
                    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
                        errors.push(format!("Latitude out of range in {}: {}", loc.description, lat));
                    }
                    if !(MIN_LON..=MAX_LON).contains(&lon) {
                        errors.push(format!("Longitude out of range in {}: {}", loc.description, lon));
                    }
                }
                _ => errors.push(format!(
                    "Invalid coordinates in {}: {}, {}",
                    loc.description, loc.lat, loc.lon
                )),
            }
        }

        // Required fields
        for (index, loc) in self.locations.iter().enumerate() {
            if loc.keywords.iter().all(|k| k.is_empty()) {
                errors.push(format!("Missing keywords in fallback location at index {}", index));
            }
            if loc.description.trim().is_empty() {
                errors.push(format!("Missing description in fallback location at index {}", index));
            }
        }

        // A broader entry matches every input its refinement matches, so it
        // must never be tried first.
        for (i, broad) in self.locations.iter().enumerate() {
            for (j, narrow) in self.locations.iter().enumerate() {
                if i != j && broad.covers(narrow) && broad.outranks(narrow) {
                    errors.push(format!(
                        "{} (priority {}) shadows more specific {} (priority {})",
                        broad.description, broad.priority, narrow.description, narrow.priority
                    ));
                }
            }
        }

        ConfigurationCheck {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn configuration_stats(&self) -> ConfigurationStats {
        let count = |a: Accuracy| self.locations.iter().filter(|l| l.accuracy == a).count();
        let total = self.locations.len();
        let average_priority = if total == 0 {
            0
        } else {
            let sum: i64 = self.locations.iter().map(|l| i64::from(l.priority)).sum();
            // Halves round toward +inf.
            (sum as f64 / total as f64 + 0.5).floor() as i64
        };

        ConfigurationStats {
            total_locations: total,
            cities_count: count(Accuracy::City),
            regions_count: count(Accuracy::Region),
            countries_count: count(Accuracy::Country),
            average_priority,
        }
    }
}

impl FallbackLookup for FallbackTable {
    fn find_fallback_coordinates(&self, location: &str) -> Option<FallbackMatch> {
        self.find(location).map(|config| FallbackMatch {
            coordinates: config.coordinates(),
            config: config.clone(),
        })
    }
}
