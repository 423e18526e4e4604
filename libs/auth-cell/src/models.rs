// libs/auth-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::auth::{Identity, Role};

/// Row shape of the `users` table. The password hash never leaves this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub speciality: Option<String>,
    pub experience: Option<i32>,
    pub consultation_fee: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            fullname: self.fullname,
            email: self.email,
            role: self.role,
            speciality: self.speciality,
            experience: self.experience,
            consultation_fee: self.consultation_fee,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub speciality: String,
    pub experience: i32,
    pub consultation_fee: f64,
}

/// Partial doctor profile update. `role` is captured only so an attempt to
/// change it can be rejected explicitly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub speciality: Option<String>,
    pub experience: Option<i32>,
    pub consultation_fee: Option<f64>,
    pub role: Option<Role>,
}

/// Public listing entry for `GET /api/doctors`. Deserialized from the
/// snake_case store row, serialized camelCase on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    pub id: Uuid,
    pub fullname: String,
    pub speciality: Option<String>,
    pub experience: Option<i32>,
    #[serde(alias = "consultation_fee")]
    pub consultation_fee: Option<f64>,
}

#[derive(Error, Debug)]
pub enum AuthCellError {
    #[error("Email already exists")]
    EmailExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Role cannot be modified")]
    RoleImmutable,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
