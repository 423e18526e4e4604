// libs/auth-cell/src/services/accounts.rs
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::{return_representation, StoreClient};
use shared_models::auth::{Identity, Role};
use shared_utils::jwt::issue_token;

use crate::models::{
    AuthCellError, DoctorSignupRequest, DoctorSummary, LoginRequest, SignupRequest,
    UpdateDoctorRequest, UserRecord,
};

const MIN_PASSWORD_LEN: usize = 6;

pub struct AccountService {
    store: Arc<StoreClient>,
    jwt_secret: String,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(StoreClient::new(config)),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Register a patient (or doctor via the generic signup path) and issue a
    /// session token.
    pub async fn signup(&self, request: SignupRequest) -> Result<(Uuid, String), AuthCellError> {
        Self::validate_signup(&request.fullname, &request.email, &request.password)?;
        if request.role == Role::Admin {
            return Err(AuthCellError::ValidationError(
                "Role must be one of: PATIENT, DOCTOR".to_string(),
            ));
        }

        if self.find_by_email(&request.email).await?.is_some() {
            warn!("Signup failed: email already exists");
            return Err(AuthCellError::EmailExists);
        }

        let user = self
            .insert_user(json!({
                "id": Uuid::new_v4(),
                "fullname": request.fullname,
                "email": request.email,
                "password": hash_password(&request.password)?,
                "role": request.role,
                "created_at": Utc::now().to_rfc3339()
            }))
            .await?;

        let token = issue_token(user.id, &user.email, user.role, &self.jwt_secret)
            .map_err(AuthCellError::TokenError)?;

        info!("User {} created successfully", user.id);
        Ok((user.id, token))
    }

    /// Register a doctor with the doctor-only profile attributes.
    pub async fn doctor_signup(
        &self,
        request: DoctorSignupRequest,
    ) -> Result<Identity, AuthCellError> {
        Self::validate_signup(&request.fullname, &request.email, &request.password)?;

        if self.find_by_email(&request.email).await?.is_some() {
            warn!("Doctor signup failed: email already exists");
            return Err(AuthCellError::EmailExists);
        }

        let user = self
            .insert_user(json!({
                "id": Uuid::new_v4(),
                "fullname": request.fullname,
                "email": request.email,
                "password": hash_password(&request.password)?,
                "role": Role::Doctor,
                "speciality": request.speciality,
                "experience": request.experience,
                "consultation_fee": request.consultation_fee,
                "created_at": Utc::now().to_rfc3339()
            }))
            .await?;

        info!("Doctor {} registered successfully", user.id);
        Ok(user.into_identity())
    }

    /// Verify credentials and issue a session token.
    pub async fn login(&self, request: LoginRequest) -> Result<String, AuthCellError> {
        let user = match self.find_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                warn!("Login failed: user not found");
                return Err(AuthCellError::InvalidCredentials);
            }
        };

        if !verify_password(&request.password, &user.password) {
            warn!("Login failed: invalid password for user {}", user.id);
            return Err(AuthCellError::InvalidCredentials);
        }

        let token = issue_token(user.id, &user.email, user.role, &self.jwt_secret)
            .map_err(AuthCellError::TokenError)?;

        info!("User {} logged in", user.id);
        Ok(token)
    }

    /// Look up the stored record behind a verified token.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Identity, AuthCellError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<UserRecord> = self
            .store
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AuthCellError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(UserRecord::into_identity)
            .ok_or(AuthCellError::UserNotFound)
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, AuthCellError> {
        let path =
            "/rest/v1/users?role=eq.DOCTOR&select=id,fullname,speciality,experience,consultation_fee";
        self.store
            .request(Method::GET, path, None, None)
            .await
            .map_err(|e| AuthCellError::DatabaseError(e.to_string()))
    }

    /// Doctor lookup used by the booking service; a user id with a non-doctor
    /// role resolves to not-found.
    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Identity, AuthCellError> {
        let path = format!("/rest/v1/users?id=eq.{}&role=eq.DOCTOR", doctor_id);
        let result: Vec<UserRecord> = self
            .store
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AuthCellError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .map(UserRecord::into_identity)
            .ok_or(AuthCellError::DoctorNotFound)
    }

    /// Partial update of a doctor profile. Role changes are rejected, and a
    /// changed email must not collide with another account.
    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<Identity, AuthCellError> {
        if request.role.is_some() {
            warn!("Update failed: role cannot be modified for doctor {}", doctor_id);
            return Err(AuthCellError::RoleImmutable);
        }

        let existing = self.get_doctor(doctor_id).await?;

        if let Some(email) = &request.email {
            if *email != existing.email && self.find_by_email(email).await?.is_some() {
                warn!("Update failed: email already exists for doctor {}", doctor_id);
                return Err(AuthCellError::EmailExists);
            }
        }

        let mut update_data = serde_json::Map::new();
        if let Some(fullname) = request.fullname {
            update_data.insert("fullname".to_string(), json!(fullname));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(speciality) = request.speciality {
            update_data.insert("speciality".to_string(), json!(speciality));
        }
        if let Some(experience) = request.experience {
            update_data.insert("experience".to_string(), json!(experience));
        }
        if let Some(consultation_fee) = request.consultation_fee {
            update_data.insert("consultation_fee".to_string(), json!(consultation_fee));
        }

        let path = format!("/rest/v1/users?id=eq.{}", doctor_id);
        let result: Vec<UserRecord> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(Value::Object(update_data)),
                Some(return_representation()),
            )
            .await
            .map_err(|e| AuthCellError::DatabaseError(e.to_string()))?;

        let updated = result
            .into_iter()
            .next()
            .ok_or(AuthCellError::DoctorNotFound)?;

        info!("Doctor {} updated successfully", doctor_id);
        Ok(updated.into_identity())
    }

    fn validate_signup(fullname: &str, email: &str, password: &str) -> Result<(), AuthCellError> {
        if fullname.trim().is_empty() {
            return Err(AuthCellError::ValidationError(
                "fullname is required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AuthCellError::ValidationError(
                "email must be a valid email".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthCellError::ValidationError(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthCellError> {
        let path = format!("/rest/v1/users?email=eq.{}&limit=1", email);
        let result: Vec<UserRecord> = self
            .store
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AuthCellError::DatabaseError(e.to_string()))?;
        Ok(result.into_iter().next())
    }

    async fn insert_user(&self, row: Value) -> Result<UserRecord, AuthCellError> {
        let result: Vec<UserRecord> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/users",
                None,
                Some(row),
                Some(return_representation()),
            )
            .await
            .map_err(|e| AuthCellError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| AuthCellError::DatabaseError("Failed to create user".to_string()))
    }
}

fn hash_password(password: &str) -> Result<String, AuthCellError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthCellError::DatabaseError(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("secret123").unwrap();
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("secret123", "not-a-phc-string"));
    }

    #[test]
    fn test_signup_validation() {
        assert!(AccountService::validate_signup("Pat", "pat@example.com", "secret1").is_ok());
        assert!(AccountService::validate_signup("", "pat@example.com", "secret1").is_err());
        assert!(AccountService::validate_signup("Pat", "not-an-email", "secret1").is_err());
        assert!(AccountService::validate_signup("Pat", "pat@example.com", "short").is_err());
    }
}
