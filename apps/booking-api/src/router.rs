use axum::{routing::get, Json, Router};
use serde_json::json;

use booking_cell::router::appointment_routes;
use booking_cell::BookingState;

pub fn create_router(state: BookingState) -> Router {
    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api/appointments", appointment_routes(state))
}
