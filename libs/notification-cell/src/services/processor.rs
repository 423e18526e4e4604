// libs/notification-cell/src/services/processor.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::{return_representation, StoreClient};

use crate::models::{ChannelEvent, DeliveryStatus, NotificationCellError, NotificationRecord};

/// Simulated delivery latency, standing in for an email/SMS provider call.
const DELIVERY_LATENCY: Duration = Duration::from_secs(1);

/// Persists channel events and runs the simulated delivery step.
///
/// Per-event state machine: received -> persisted PENDING -> SENT | FAILED.
/// A failed delivery is terminal; there is no retry.
pub struct NotificationProcessor {
    store: Arc<StoreClient>,
    delivery_latency: Duration,
}

impl NotificationProcessor {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
            delivery_latency: DELIVERY_LATENCY,
        }
    }

    /// Zero-latency variant for tests.
    pub fn with_delivery_latency(config: &AppConfig, delivery_latency: Duration) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
            delivery_latency,
        }
    }

    /// Persist an event and attempt delivery. Failures are logged and
    /// absorbed; the consumer loop never stops on a bad event.
    pub async fn process(&self, event: ChannelEvent) {
        info!(
            "Processing {} notification for appointment {}",
            event.notification_type, event.appointment_id
        );

        let record = match self.persist(&event).await {
            Ok(record) => record,
            Err(e) => {
                error!("Error processing notification: {}", e);
                return;
            }
        };

        info!("Notification saved: {}", record.id);
        self.deliver(&record).await;
    }

    async fn persist(&self, event: &ChannelEvent) -> Result<NotificationRecord, NotificationCellError> {
        let row = json!({
            "id": Uuid::new_v4(),
            "appointment_id": event.appointment_id,
            "patient_id": event.patient_id,
            "doctor_id": event.doctor_id,
            "message": event.message,
            "notification_type": event.notification_type,
            "status": DeliveryStatus::Pending,
            "read": false,
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<NotificationRecord> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/notifications",
                None,
                Some(row),
                Some(return_representation()),
            )
            .await
            .map_err(|e| NotificationCellError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or_else(|| {
            NotificationCellError::DatabaseError("Failed to create notification".to_string())
        })
    }

    /// Simulated async delivery; replace with a real email/SMS integration.
    async fn deliver(&self, record: &NotificationRecord) {
        tokio::time::sleep(self.delivery_latency).await;

        match self.update_status(record.id, DeliveryStatus::Sent).await {
            Ok(()) => info!("Notification sent: {}", record.message),
            Err(e) => {
                error!("Failed to send notification: {}", e);
                if let Err(e) = self.update_status(record.id, DeliveryStatus::Failed).await {
                    error!("Failed to mark notification {} as failed: {}", record.id, e);
                }
            }
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
    ) -> Result<(), NotificationCellError> {
        let path = format!("/rest/v1/notifications?id=eq.{}", id);
        let _: Vec<NotificationRecord> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(json!({ "status": status })),
                Some(return_representation()),
            )
            .await
            .map_err(|e| NotificationCellError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}
