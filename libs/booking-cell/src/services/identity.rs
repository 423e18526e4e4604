// libs/booking-cell/src/services/identity.rs
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::Identity;

use crate::models::BookingError;

/// One explicit timeout for every auth-service call, no retries.
const AUTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: Identity,
}

#[derive(Debug, Deserialize)]
struct DoctorEnvelope {
    doctor: Identity,
}

/// HTTP client for the credential store (auth service).
pub struct IdentityClient {
    client: Client,
    base_url: String,
}

impl IdentityClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(AUTH_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base_url: config.auth_service_url.clone(),
        }
    }

    /// Resolve a bearer token to the caller's identity. A rejected token
    /// resolves to `None`; only transport failures surface as errors.
    pub async fn validate_user(&self, token: &str) -> Result<Option<Identity>, BookingError> {
        let url = format!("{}/api/auth", self.base_url);
        debug!("Validating user with auth service");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                warn!("Error communicating with auth service: {}", e);
                BookingError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            warn!(
                "Failed to validate user with auth service (status {})",
                response.status()
            );
            return Ok(None);
        }

        let envelope: UserEnvelope = response
            .json()
            .await
            .map_err(|e| BookingError::Upstream(e.to_string()))?;

        Ok(Some(envelope.user))
    }

    /// Look up a doctor by id. Unknown ids and non-doctor users resolve to
    /// `None`.
    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        token: &str,
    ) -> Result<Option<Identity>, BookingError> {
        let url = format!("{}/api/doctors/{}", self.base_url, doctor_id);
        debug!("Looking up doctor {} with auth service", doctor_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                warn!("Error getting doctor {} from auth service: {}", doctor_id, e);
                BookingError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            warn!(
                "Failed to get doctor {} from auth service (status {})",
                doctor_id,
                response.status()
            );
            return Ok(None);
        }

        let envelope: DoctorEnvelope = response
            .json()
            .await
            .map_err(|e| BookingError::Upstream(e.to_string()))?;

        Ok(Some(envelope.doctor))
    }
}
