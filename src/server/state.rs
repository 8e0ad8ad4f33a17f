use crate::location::GeocodingService;

pub struct AppState {
    pub service: GeocodingService,
}
