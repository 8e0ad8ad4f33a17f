mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::location::GeocodingService;

pub fn build_router(service: GeocodingService) -> Router {
    let state = Arc::new(AppState { service });

    // The table never changes while the process runs.
    let table_routes = Router::new()
        .route("/api/locations", get(handlers::locations))
        .route("/api/locations/stats", get(handlers::stats))
        .route("/api/regions", get(handlers::regions))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        ));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/validate", get(handlers::validate))
        .merge(table_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, service: GeocodingService) -> std::io::Result<()> {
    let app = build_router(service);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "server listening");
    eprintln!("  natal-geo API listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app).await
}
