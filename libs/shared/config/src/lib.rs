use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_anon_key: String,
    pub jwt_secret: String,
    pub auth_service_url: String,
    pub redis_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("STORE_URL not set, using local default");
                    "http://localhost:54321".to_string()
                }),
            store_anon_key: env::var("STORE_ANON_KEY")
                .unwrap_or_else(|_| {
                    warn!("STORE_ANON_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using development default");
                    "dev_secret".to_string()
                }),
            auth_service_url: env::var("AUTH_SERVICE_URL")
                .unwrap_or_else(|_| {
                    warn!("AUTH_SERVICE_URL not set, using local default");
                    "http://localhost:4001".to_string()
                }),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| {
                    warn!("REDIS_URL not set, using local default");
                    "redis://localhost:6379".to_string()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty()
            && !self.jwt_secret.is_empty()
            && !self.auth_service_url.is_empty()
    }
}
