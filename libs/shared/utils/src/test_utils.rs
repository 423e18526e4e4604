use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, Role};

pub struct TestConfig {
    pub jwt_secret: String,
    pub store_url: String,
    pub store_anon_key: String,
    pub auth_service_url: String,
    pub redis_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            store_url: "http://localhost:54321".to_string(),
            store_anon_key: "test-anon-key".to_string(),
            auth_service_url: "http://localhost:4001".to_string(),
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the store at a wiremock server.
    pub fn with_store_url(mut self, url: &str) -> Self {
        self.store_url = url.to_string();
        self
    }

    /// Point the identity client at a wiremock server.
    pub fn with_auth_service_url(mut self, url: &str) -> Self {
        self.auth_service_url = url.to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_url: self.store_url.clone(),
            store_anon_key: self.store_anon_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            auth_service_url: self.auth_service_url.clone(),
            redis_url: self.redis_url.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::patient("test@example.com")
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            fullname: "Test User".to_string(),
            role,
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn doctor(email: &str) -> Self {
        let mut user = Self::new(email, Role::Doctor);
        user.fullname = "Test Doctor".to_string();
        user
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: Some(self.email.clone()),
            role: self.role,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// JSON row builders matching the PostgREST table shapes, for wiremock
/// responses in integration tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn user_row(user: &TestUser) -> Value {
        let mut row = json!({
            "id": user.id,
            "fullname": user.fullname,
            "email": user.email,
            "password": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hash",
            "role": user.role,
            "speciality": null,
            "experience": null,
            "consultation_fee": null,
            "created_at": Utc::now().to_rfc3339()
        });
        if user.role == Role::Doctor {
            row["speciality"] = json!("General Practice");
            row["experience"] = json!(8);
            row["consultation_fee"] = json!(75.0);
        }
        row
    }

    pub fn appointment_row(
        id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        date_time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "date_time": date_time,
            "status": status,
            "notes": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn notification_row(
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        notification_type: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "message": "Appointment status updated to: CONFIRMED",
            "notification_type": notification_type,
            "status": status,
            "read": false,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    /// Body returned by the auth service for `GET /api/auth`.
    pub fn identity_response(user: &TestUser) -> Value {
        let mut identity = json!({
            "id": user.id,
            "fullname": user.fullname,
            "email": user.email,
            "role": user.role
        });
        if user.role == Role::Doctor {
            identity["speciality"] = json!("General Practice");
            identity["experience"] = json!(8);
            identity["consultationFee"] = json!(75.0);
        }
        json!({ "message": "User profile", "user": identity })
    }

    /// Body returned by the auth service for `GET /api/doctors/{id}`.
    pub fn doctor_response(user: &TestUser) -> Value {
        json!({
            "message": "Doctor info",
            "doctor": {
                "id": user.id,
                "fullname": user.fullname,
                "email": user.email,
                "role": user.role,
                "speciality": "General Practice",
                "experience": 8,
                "consultationFee": 75.0
            }
        })
    }
}
