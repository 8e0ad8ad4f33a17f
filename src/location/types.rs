//! Core types for the location subsystem.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A latitude/longitude pair in decimal degrees, kept as the raw strings
/// the caller supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: String,
    pub lon: String,
}

impl Coordinates {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lat.trim().is_empty() && self.lon.trim().is_empty()
    }
}

/// Numeric form of a validated coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParsedCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// How precisely a fallback coordinate represents the named place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
    City,
    Region,
    Country,
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::City => write!(f, "city"),
            Self::Region => write!(f, "region"),
            Self::Country => write!(f, "country"),
        }
    }
}

/// Qualitative trust in a validated coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Number of decimal digits carried by a coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for PrecisionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Outcome of validating a coordinate pair. Errors make the pair unusable,
/// warnings only lower the confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub confidence: Confidence,
}

/// Birth data as submitted by a form, with whatever coordinates the location
/// search returned (possibly empty).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthDataWithCoordinates {
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub location_of_birth: String,
    #[serde(default)]
    pub coordinates: Coordinates,
}

impl BirthDataWithCoordinates {
    /// Parse `YYYY-MM-DD` and `HH:MM` (seconds optional) into a local
    /// wall-clock timestamp. Returns None when either part is malformed.
    pub fn birth_datetime(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d").ok()?;
        let raw_time = self.time_of_birth.trim();
        let time = NaiveTime::parse_from_str(raw_time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw_time, "%H:%M:%S"))
            .ok()?;
        Some(date.and_time(time))
    }
}

/// Where resolved coordinates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSource {
    Original,
    Fallback,
}

impl fmt::Display for CoordinateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Usable coordinates plus provenance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCoordinates {
    pub coordinates: Coordinates,
    pub source: CoordinateSource,
    pub validation_result: CoordinateValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<Accuracy>,
}

/// Result of reconciling supplied coordinates with the fallback table.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(ResolvedCoordinates),
    /// Neither the supplied coordinates nor the fallback table produced a
    /// usable pair. Callers should ask the user to pick a search result.
    Unresolved {
        location: String,
        validation_result: CoordinateValidationResult,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&ResolvedCoordinates> {
        match self {
            Self::Resolved(r) => Some(r),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<ResolvedCoordinates, GeocodingError> {
        match self {
            Self::Resolved(r) => Ok(r),
            Self::Unresolved { location, .. } => Err(GeocodingError::Unresolvable { location }),
        }
    }
}

/// Location subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum GeocodingError {
    #[error("No valid coordinates available for location: {location}")]
    Unresolvable { location: String },

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Failed to read location table {path}: {source}")]
    TableRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse location table: {0}")]
    TableParse(#[from] serde_json::Error),

    #[error("Location table failed validation: {}", .0.join("; "))]
    InvalidTable(Vec<String>),
}
