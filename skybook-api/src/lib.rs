use axum::{
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod flights;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/v1/airports", get(flights::list_airports))
        .route("/v1/flights/search", get(flights::search_flights))
        .route("/v1/flights/{id}", get(flights::get_flight))
        .route("/v1/fares/estimate", post(flights::estimate_price))
        .route("/v1/admin/flights", post(flights::create_flight))
        .route("/v1/bookings", post(bookings::create_booking))
        .route("/v1/bookings/{reference}", get(bookings::get_booking))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "skybook-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
