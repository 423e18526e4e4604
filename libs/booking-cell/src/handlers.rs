// libs/booking-cell/src/handlers.rs
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{Appointment, BookingError, CreateAppointmentRequest, UpdateStatusRequest};
use crate::services::booking::BookingWorkflow;
use crate::BookingState;

// Helper function to extract token
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("No token provided".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    Ok(auth_value[7..].to_string())
}

fn map_error(e: BookingError) -> AppError {
    match e {
        BookingError::Unauthorized => AppError::Auth("Invalid user token".to_string()),
        BookingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        BookingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        BookingError::NotPermitted => {
            AppError::Forbidden("Not authorized to update this appointment".to_string())
        }
        BookingError::SlotUnavailable => {
            AppError::Conflict("This time slot is not available".to_string())
        }
        BookingError::InvalidStatus(msg) => AppError::InvalidStatus(msg),
        BookingError::InvalidTime(msg) => AppError::ValidationError(msg),
        BookingError::Upstream(msg) => AppError::ExternalService(msg),
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn appointment_json(appointment: &Appointment, include_updated_at: bool) -> Value {
    let mut body = json!({
        "id": appointment.id,
        "patientId": appointment.patient_id,
        "doctorId": appointment.doctor_id,
        "dateTime": appointment.date_time,
        "status": appointment.status,
        "notes": appointment.notes,
        "createdAt": appointment.created_at
    });
    if include_updated_at {
        body["updatedAt"] = json!(appointment.updated_at);
    }
    body
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<BookingState>,
    headers: HeaderMap,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = extract_bearer_token(&headers)?;
    let workflow = BookingWorkflow::new(&state.config, state.publisher.clone());

    let appointment = workflow
        .create_appointment(&token, request)
        .await
        .map_err(map_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Appointment created successfully",
            "appointment": appointment_json(&appointment, false)
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointments(
    State(state): State<BookingState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = extract_bearer_token(&headers)?;
    let workflow = BookingWorkflow::new(&state.config, state.publisher.clone());

    let appointments = workflow
        .list_appointments(&token)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "message": "Appointments retrieved successfully",
        "appointments": appointments
            .iter()
            .map(|a| appointment_json(a, true))
            .collect::<Vec<_>>()
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<BookingState>,
    headers: HeaderMap,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let token = extract_bearer_token(&headers)?;
    let workflow = BookingWorkflow::new(&state.config, state.publisher.clone());

    let appointment = workflow
        .update_status(&token, appointment_id, request.status)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "message": "Appointment status updated successfully",
        "appointment": appointment_json(&appointment, true)
    })))
}
