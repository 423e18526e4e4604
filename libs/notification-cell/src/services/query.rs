// libs/notification-cell/src/services/query.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::StoreClient;

use crate::models::{
    NotificationCellError, NotificationQueryParams, NotificationRecord, NotificationStats,
};

/// Result sets are capped at the 50 most recent records.
const MAX_RESULTS: usize = 50;

pub struct NotificationQueryService {
    store: Arc<StoreClient>,
}

impl NotificationQueryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
        }
    }

    /// Most-recent notifications where the user is the patient or the doctor
    /// on the record, optionally filtered by type and read flag.
    pub async fn user_notifications(
        &self,
        user_id: Uuid,
        params: &NotificationQueryParams,
    ) -> Result<Vec<NotificationRecord>, NotificationCellError> {
        let mut path = format!(
            "/rest/v1/notifications?or=(patient_id.eq.{},doctor_id.eq.{})&order=created_at.desc&limit={}",
            user_id, user_id, MAX_RESULTS
        );
        if let Some(notification_type) = params.notification_type {
            path.push_str(&format!("&notification_type=eq.{}", notification_type));
        }
        if let Some(read) = params.read {
            path.push_str(&format!("&read=eq.{}", read));
        }

        debug!("Fetching notifications for user {}", user_id);
        self.store
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| NotificationCellError::DatabaseError(e.to_string()))
    }

    pub async fn stats(&self) -> Result<NotificationStats, NotificationCellError> {
        let total = self.count("/rest/v1/notifications?select=id").await?;
        let sent = self
            .count("/rest/v1/notifications?select=id&status=eq.SENT")
            .await?;
        let read = self
            .count("/rest/v1/notifications?select=id&read=eq.true")
            .await?;

        Ok(NotificationStats {
            total,
            sent,
            read,
            unread: total - read,
        })
    }

    async fn count(&self, path: &str) -> Result<usize, NotificationCellError> {
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, path, None, None)
            .await
            .map_err(|e| NotificationCellError::DatabaseError(e.to_string()))?;
        Ok(rows.len())
    }
}
