use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use auth_cell::router::auth_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/api/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/api", auth_routes(state))
}
