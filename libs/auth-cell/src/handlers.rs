// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, Role};
use shared_models::error::AppError;

use crate::models::{
    AuthCellError, DoctorSignupRequest, LoginRequest, SignupRequest, UpdateDoctorRequest,
};
use crate::services::accounts::AccountService;

fn map_error(e: AuthCellError) -> AppError {
    match e {
        AuthCellError::EmailExists => AppError::Conflict("Email already exists".to_string()),
        AuthCellError::InvalidCredentials => AppError::Auth("Invalid credentials".to_string()),
        AuthCellError::UserNotFound => AppError::NotFound("User not found".to_string()),
        AuthCellError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AuthCellError::RoleImmutable => AppError::BadRequest("Role cannot be modified".to_string()),
        AuthCellError::ValidationError(msg) => AppError::ValidationError(msg),
        AuthCellError::TokenError(msg) => AppError::Internal(msg),
        AuthCellError::DatabaseError(msg) => AppError::Database(msg),
    }
}

pub async fn signup(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    info!("User signup attempt");

    let service = AccountService::new(&config);
    let (user_id, token) = service.signup(request).await.map_err(map_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created",
            "userId": user_id,
            "token": token
        })),
    ))
}

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User login attempt");

    let service = AccountService::new(&config);
    let token = service.login(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token
    })))
}

/// Resolve the bearer token to the stored user record. This is the endpoint
/// the booking service calls to validate callers.
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&config);
    let identity = service.get_profile(user.id).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "User profile",
        "user": identity
    })))
}

pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&config);
    let doctors = service.list_doctors().await.map_err(map_error)?;

    Ok(Json(json!(doctors)))
}

pub async fn doctor_signup(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<DoctorSignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    info!("Doctor signup attempt");

    let service = AccountService::new(&config);
    let doctor = service.doctor_signup(request).await.map_err(map_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Doctor registered successfully",
            "doctor": {
                "id": doctor.id,
                "fullname": doctor.fullname,
                "email": doctor.email,
                "speciality": doctor.speciality
            }
        })),
    ))
}

pub async fn doctor_login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    info!("Doctor login attempt");

    let service = AccountService::new(&config);
    let token = service.login(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token
    })))
}

pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&config);
    let doctor = service.get_doctor(doctor_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "message": "Doctor info",
        "doctor": doctor
    })))
}

pub async fn update_doctor(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    // Doctors may only edit their own profile; admins may edit any.
    if user.id != doctor_id && user.role != Role::Admin {
        return Err(AppError::Forbidden(
            "Not authorized to update this doctor".to_string(),
        ));
    }

    let service = AccountService::new(&config);
    let doctor = service
        .update_doctor(doctor_id, request)
        .await
        .map_err(|e| match e {
            // The doctor-update path reports a duplicate email as a bad request.
            AuthCellError::EmailExists => AppError::BadRequest("Email already exists".to_string()),
            other => map_error(other),
        })?;

    Ok(Json(json!({
        "message": "Doctor updated successfully",
        "doctor": doctor
    })))
}
