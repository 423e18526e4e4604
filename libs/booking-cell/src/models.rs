// libs/booking-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Row shape of the `appointments` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Terminal statuses do not occupy a slot.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "PENDING"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::NoShow => write!(f, "NO_SHOW"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub doctor_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// NOTIFICATION EVENTS
// ==============================================================================

/// Channel name shared with the notification service.
pub const NOTIFICATIONS_CHANNEL: &str = "notifications";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    AppointmentCreated,
    AppointmentUpdated,
}

/// One JSON message per appointment create/update, published on the shared
/// channel and consumed asynchronously by the notification service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(
        appointment: &Appointment,
        message: String,
        notification_type: NotificationType,
    ) -> Self {
        Self {
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            message,
            notification_type,
            timestamp: Utc::now(),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid user token")]
    Unauthorized,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment not found")]
    NotFound,

    #[error("Not authorized to update this appointment")]
    NotPermitted,

    #[error("This time slot is not available")]
    SlotUnavailable,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Auth service unavailable: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
