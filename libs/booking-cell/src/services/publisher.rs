// libs/booking-cell/src/services/publisher.rs
use deadpool_redis::{Config, Pool, Runtime};
use tracing::{info, warn};

use shared_config::AppConfig;

use crate::models::{NotificationEvent, NOTIFICATIONS_CHANNEL};

/// Outcome of a best-effort dispatch. Never propagated to the caller; a
/// failed enqueue is logged and absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Enqueued,
    EnqueueFailed,
}

/// Publishes notification events on the shared channel.
///
/// The pool is owned by this instance and injected where needed; when Redis
/// is unreachable at startup the publisher runs disabled and every dispatch
/// reports `EnqueueFailed`.
pub struct NotificationPublisher {
    pool: Option<Pool>,
}

impl NotificationPublisher {
    /// Connect to Redis, degrading to a disabled publisher on failure.
    pub async fn connect(config: &AppConfig) -> Self {
        let pool = match Config::from_url(config.redis_url.clone()).create_pool(Some(Runtime::Tokio1))
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Redis pool creation failed - notifications disabled: {}", e);
                return Self { pool: None };
            }
        };

        match pool.get().await {
            Ok(mut conn) => {
                let ping: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
                match ping {
                    Ok(_) => {
                        info!("Redis connected for notifications");
                        Self { pool: Some(pool) }
                    }
                    Err(e) => {
                        warn!("Redis ping failed - notifications disabled: {}", e);
                        Self { pool: None }
                    }
                }
            }
            Err(e) => {
                warn!("Redis connection failed - notifications disabled: {}", e);
                Self { pool: None }
            }
        }
    }

    /// A publisher with no channel behind it; used in tests and when the
    /// channel is down at boot.
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    /// Fire-and-forget publish. At most once; failures are logged only.
    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchOutcome {
        let Some(pool) = &self.pool else {
            warn!("Notification channel not connected - event skipped");
            return DispatchOutcome::EnqueueFailed;
        };

        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize notification event: {}", e);
                return DispatchOutcome::EnqueueFailed;
            }
        };

        let mut conn = match pool.get().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to queue notification: {}", e);
                return DispatchOutcome::EnqueueFailed;
            }
        };

        let published: Result<(), redis::RedisError> = redis::cmd("PUBLISH")
            .arg(NOTIFICATIONS_CHANNEL)
            .arg(&payload)
            .query_async(&mut conn)
            .await;

        match published {
            Ok(()) => {
                info!(
                    "Notification queued: {:?} for appointment {}",
                    event.notification_type, event.appointment_id
                );
                DispatchOutcome::Enqueued
            }
            Err(e) => {
                warn!("Failed to queue notification: {}", e);
                DispatchOutcome::EnqueueFailed
            }
        }
    }
}
