// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;

use crate::models::NotificationQueryParams;
use crate::services::query::NotificationQueryService;

/// Notifications for one user; callers may only read their own unless admin.
#[axum::debug_handler]
pub async fn get_user_notifications(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<NotificationQueryParams>,
) -> Result<Json<Value>, AppError> {
    if user.id != user_id && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to access this resource".to_string(),
        ));
    }

    let service = NotificationQueryService::new(&config);
    let notifications = service
        .user_notifications(user_id, &params)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    info!(
        "Fetched {} notifications for user {}",
        notifications.len(),
        user_id
    );

    Ok(Json(json!({
        "success": true,
        "data": notifications,
        "count": notifications.len()
    })))
}

#[axum::debug_handler]
pub async fn get_stats(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let service = NotificationQueryService::new(&config);
    let stats = service
        .stats()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": stats
    })))
}
