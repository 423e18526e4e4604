pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::publisher::NotificationPublisher;

/// Shared state for the booking service: configuration plus the
/// process-scoped notification publisher.
#[derive(Clone)]
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub publisher: Arc<NotificationPublisher>,
}

impl BookingState {
    pub fn new(config: Arc<AppConfig>, publisher: Arc<NotificationPublisher>) -> Self {
        Self { config, publisher }
    }
}
