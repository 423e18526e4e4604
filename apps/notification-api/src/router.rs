use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use notification_cell::router::notification_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api/notifications", notification_routes(state))
}
