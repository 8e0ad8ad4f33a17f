use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::location::{
    extract_country_from_location, format_coordinates_for_display, is_searchable_location,
    precision_level, validate_coordinates, BirthDataWithCoordinates, ConfigurationStats,
    CoordinateValidationResult, Coordinates, FallbackLocation, GeocodingError, PrecisionLevel,
    Resolution, ResolvedCoordinates, MIN_LOCATION_SEARCH_LENGTH,
};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/health ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub locations: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        locations: state.service.lookup().len(),
    })
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ResolveQuery {
    pub location: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub resolved: ResolvedCoordinates,
    pub formatted_coords: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_datetime: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();

    let location = params.location.as_deref().unwrap_or("").trim().to_string();
    let coordinates = Coordinates::new(
        params.lat.unwrap_or_default(),
        params.lon.unwrap_or_default(),
    );
    if location.is_empty() && coordinates.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Provide 'location' or 'lat'+'lon' parameters",
        ));
    }
    // Without usable coordinates the location goes to the table lookup.
    if !validate_coordinates(&coordinates).is_valid && !is_searchable_location(&location) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!(
                "Location must be at least {} characters when 'lat'+'lon' are not usable",
                MIN_LOCATION_SEARCH_LENGTH
            ),
        ));
    }

    let birth = BirthDataWithCoordinates {
        date_of_birth: params.date.unwrap_or_default(),
        time_of_birth: params.time.unwrap_or_default(),
        location_of_birth: location.clone(),
        coordinates,
    };

    let has_timing = !birth.date_of_birth.is_empty() || !birth.time_of_birth.is_empty();
    let birth_datetime = if has_timing {
        let dt = birth.birth_datetime().ok_or_else(|| {
            api_error(
                StatusCode::BAD_REQUEST,
                format!(
                    "Invalid birth date/time '{} {}'. Use YYYY-MM-DD and HH:MM.",
                    birth.date_of_birth, birth.time_of_birth
                ),
            )
        })?;
        Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    } else {
        None
    };

    let resolved = match state.service.process_coordinates(&birth) {
        Resolution::Resolved(r) => r,
        Resolution::Unresolved { location, .. } => {
            let err = GeocodingError::Unresolvable { location };
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("{}. Pick the location from the search results instead.", err),
            ));
        }
    };

    info!(
        location = %location,
        source = %resolved.source,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/resolve"
    );

    Ok(Json(ResolveResponse {
        formatted_coords: format_coordinates_for_display(&resolved.coordinates),
        country: extract_country_from_location(&location),
        birth_datetime,
        resolved,
    }))
}

// ─── GET /api/validate ───────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct ValidateQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    #[serde(flatten)]
    pub result: CoordinateValidationResult,
    pub formatted_coords: String,
    pub precision: PrecisionLevel,
}

pub async fn validate(Query(params): Query<ValidateQuery>) -> Json<ValidateResponse> {
    let coordinates = Coordinates::new(
        params.lat.unwrap_or_default(),
        params.lon.unwrap_or_default(),
    );
    Json(ValidateResponse {
        result: validate_coordinates(&coordinates),
        formatted_coords: format_coordinates_for_display(&coordinates),
        precision: precision_level(&coordinates),
    })
}

// ─── Table endpoints ─────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct LocationsQuery {
    pub keyword: Option<String>,
}

pub async fn locations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationsQuery>,
) -> Json<Vec<FallbackLocation>> {
    let table = state.service.lookup();
    let entries = match params.keyword.as_deref().map(str::trim) {
        Some(k) if !k.is_empty() => table
            .fallback_locations_by_keyword(k)
            .into_iter()
            .cloned()
            .collect(),
        _ => table.locations().to_vec(),
    };
    Json(entries)
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<ConfigurationStats> {
    Json(state.service.lookup().configuration_stats())
}

pub async fn regions(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.service.lookup().supported_regions())
}
