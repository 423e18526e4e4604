// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::{return_representation, StoreClient};
use shared_models::auth::Role;

use crate::models::{
    Appointment, AppointmentStatus, BookingError, CreateAppointmentRequest, NotificationEvent,
    NotificationType,
};
use crate::services::identity::IdentityClient;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::publisher::NotificationPublisher;

/// The booking workflow: token validation against the credential store,
/// doctor validation, slot-exclusivity and status-transition rules, and the
/// best-effort notification side channel.
pub struct BookingWorkflow {
    store: Arc<StoreClient>,
    identity: IdentityClient,
    lifecycle: AppointmentLifecycleService,
    publisher: Arc<NotificationPublisher>,
}

impl BookingWorkflow {
    pub fn new(config: &AppConfig, publisher: Arc<NotificationPublisher>) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
            identity: IdentityClient::new(config),
            lifecycle: AppointmentLifecycleService::new(),
            publisher,
        }
    }

    /// Book a new appointment for the calling patient.
    pub async fn create_appointment(
        &self,
        token: &str,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Creating appointment with doctor {} at {}",
            request.doctor_id, request.date_time
        );

        let user = self
            .identity
            .validate_user(token)
            .await?
            .ok_or(BookingError::Unauthorized)?;

        let doctor = self
            .identity
            .get_doctor(request.doctor_id, token)
            .await?
            .filter(|d| d.role == Role::Doctor)
            .ok_or(BookingError::DoctorNotFound)?;

        if request.date_time <= Utc::now() {
            return Err(BookingError::InvalidTime(
                "dateTime must be in the future".to_string(),
            ));
        }

        // Slot-exclusivity check. Deliberately check-then-insert with no
        // transaction, matching the original service; two concurrent requests
        // can both pass this check.
        let existing = self
            .find_active_at_slot(request.doctor_id, &request, token)
            .await?;
        if !existing.is_empty() {
            warn!(
                "Time slot not available for doctor {} at {}",
                request.doctor_id, request.date_time
            );
            return Err(BookingError::SlotUnavailable);
        }

        let now = Utc::now();
        let row = json!({
            "id": Uuid::new_v4(),
            "patient_id": user.id,
            "doctor_id": request.doctor_id,
            "date_time": slot_timestamp(&request.date_time),
            "status": AppointmentStatus::Pending,
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Appointment> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(token),
                Some(row),
                Some(return_representation()),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let appointment = result.into_iter().next().ok_or_else(|| {
            BookingError::DatabaseError("Failed to create appointment".to_string())
        })?;

        let message = format!(
            "Appointment created between {} and Dr. {} on {}",
            user.fullname, doctor.fullname, request.date_time
        );
        self.publisher
            .dispatch(&NotificationEvent::new(
                &appointment,
                message,
                NotificationType::AppointmentCreated,
            ))
            .await;

        info!("Appointment {} created successfully", appointment.id);
        Ok(appointment)
    }

    /// All appointments where the caller is the doctor (doctors) or the
    /// patient (everyone else), newest first.
    pub async fn list_appointments(&self, token: &str) -> Result<Vec<Appointment>, BookingError> {
        let user = self
            .identity
            .validate_user(token)
            .await?
            .ok_or(BookingError::Unauthorized)?;

        let filter = match user.role {
            Role::Doctor => format!("doctor_id=eq.{}", user.id),
            _ => format!("patient_id=eq.{}", user.id),
        };
        let path = format!("/rest/v1/appointments?{}&order=date_time.desc", filter);

        let appointments: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, Some(token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        info!(
            "Retrieved {} appointments for user {}",
            appointments.len(),
            user.id
        );
        Ok(appointments)
    }

    /// Apply a status change under the role's ordering rules and publish an
    /// update event.
    pub async fn update_status(
        &self,
        token: &str,
        appointment_id: Uuid,
        requested: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        info!(
            "Updating appointment {} status to {}",
            appointment_id, requested
        );

        let user = self
            .identity
            .validate_user(token)
            .await?
            .ok_or(BookingError::Unauthorized)?;

        let appointment = self.get_appointment(appointment_id, token).await?;

        let is_participant = match user.role {
            Role::Doctor => appointment.doctor_id == user.id,
            Role::Patient => appointment.patient_id == user.id,
            Role::Admin => false,
        };
        if !is_participant {
            warn!(
                "User {} not authorized to update appointment {}",
                user.id, appointment_id
            );
            return Err(BookingError::NotPermitted);
        }

        self.lifecycle
            .validate_transition(user.role, appointment.status, requested)?;

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let update = json!({
            "status": requested,
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Appointment> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(token),
                Some(update),
                Some(return_representation()),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let updated = result.into_iter().next().ok_or_else(|| {
            BookingError::DatabaseError("Failed to update appointment".to_string())
        })?;

        let message = format!("Appointment status updated to: {}", requested);
        self.publisher
            .dispatch(&NotificationEvent::new(
                &updated,
                message,
                NotificationType::AppointmentUpdated,
            ))
            .await;

        info!(
            "Appointment {} status updated to {}",
            appointment_id, requested
        );
        Ok(updated)
    }

    async fn get_appointment(
        &self,
        appointment_id: Uuid,
        token: &str,
    ) -> Result<Appointment, BookingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self
            .store
            .request(Method::GET, &path, Some(token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(BookingError::NotFound)
    }

    async fn find_active_at_slot(
        &self,
        doctor_id: Uuid,
        request: &CreateAppointmentRequest,
        token: &str,
    ) -> Result<Vec<Appointment>, BookingError> {
        let at = slot_timestamp(&request.date_time);
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date_time=eq.{}&status=not.in.(CANCELLED,NO_SHOW)",
            doctor_id, at
        );

        self.store
            .request(Method::GET, &path, Some(token), None)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))
    }
}

/// One timestamp representation for slot rows and slot queries. RFC 3339 with
/// a Z suffix stays query-string safe, and subseconds are preserved so the
/// conflict check sees exactly what was stored.
fn slot_timestamp(date_time: &DateTime<Utc>) -> String {
    date_time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
