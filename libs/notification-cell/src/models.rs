// libs/notification-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Channel the booking service publishes on.
pub const NOTIFICATIONS_CHANNEL: &str = "notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    AppointmentCreated,
    AppointmentUpdated,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::AppointmentCreated => write!(f, "APPOINTMENT_CREATED"),
            NotificationType::AppointmentUpdated => write!(f, "APPOINTMENT_UPDATED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

/// Event as received from the channel. Malformed payloads fail to parse here
/// and are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEvent {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Row shape of the `notifications` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub message: String,
    pub notification_type: NotificationType,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Feed filters. An empty value (`?type=&read=`) means "no filter", matching
/// the documented URL shape.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationQueryParams {
    #[serde(rename = "type", default, deserialize_with = "type_filter")]
    pub notification_type: Option<NotificationType>,
    #[serde(default, deserialize_with = "read_filter")]
    pub read: Option<bool>,
}

fn type_filter<'de, D>(deserializer: D) -> Result<Option<NotificationType>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => serde_json::from_value(serde_json::Value::String(value.to_string()))
            .map(Some)
            .map_err(de::Error::custom),
    }
}

fn read_filter<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<bool>().map(Some).map_err(de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationStats {
    pub total: usize,
    pub sent: usize,
    pub read: usize,
    pub unread: usize,
}

#[derive(Error, Debug)]
pub enum NotificationCellError {
    #[error("Malformed notification event: {0}")]
    MalformedEvent(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_empty_values_mean_no_filter() {
        let params: NotificationQueryParams =
            serde_json::from_value(json!({ "type": "", "read": "" })).unwrap();
        assert!(params.notification_type.is_none());
        assert!(params.read.is_none());

        let params: NotificationQueryParams = serde_json::from_value(json!({})).unwrap();
        assert!(params.notification_type.is_none());
        assert!(params.read.is_none());
    }

    #[test]
    fn test_query_params_values_parse() {
        let params: NotificationQueryParams =
            serde_json::from_value(json!({ "type": "APPOINTMENT_CREATED", "read": "false" }))
                .unwrap();
        assert_eq!(
            params.notification_type,
            Some(NotificationType::AppointmentCreated)
        );
        assert_eq!(params.read, Some(false));
    }

    #[test]
    fn test_query_params_reject_unknown_type() {
        let result: Result<NotificationQueryParams, _> =
            serde_json::from_value(json!({ "type": "APPOINTMENT_DELETED" }));
        assert!(result.is_err());
    }
}
