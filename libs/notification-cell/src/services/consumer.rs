// libs/notification-cell/src/services/consumer.rs
use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, info};

use shared_config::AppConfig;

use crate::models::{ChannelEvent, NOTIFICATIONS_CHANNEL};
use crate::services::processor::NotificationProcessor;

/// Subscribe to the notifications channel and process events one at a time
/// as the channel delivers them.
///
/// Subscription failure at boot is fatal for the service; a malformed
/// payload is logged and dropped with no retry or dead-letter.
pub async fn start_listening(
    config: &AppConfig,
    processor: Arc<NotificationProcessor>,
) -> Result<(), redis::RedisError> {
    let client = redis::Client::open(config.redis_url.as_str())?;
    let conn = client.get_async_connection().await?;
    let mut pubsub = conn.into_pubsub();
    pubsub.subscribe(NOTIFICATIONS_CHANNEL).await?;

    info!("Listening for notifications on '{}'", NOTIFICATIONS_CHANNEL);

    let mut messages = pubsub.on_message();
    while let Some(message) = messages.next().await {
        let payload: String = match message.get_payload() {
            Ok(payload) => payload,
            Err(e) => {
                error!("Error reading channel message: {}", e);
                continue;
            }
        };

        match serde_json::from_str::<ChannelEvent>(&payload) {
            Ok(event) => processor.process(event).await,
            Err(e) => error!("Error parsing message: {}", e),
        }
    }

    Ok(())
}
