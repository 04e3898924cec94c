//! Character-deletion consumer: listens on the external character-status topic, reacts
//! only to `type = DELETED`, and tombstones every affected aggregate via the Processor.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use marriage_bus::BusConsumer;
use marriage_common::{RequestScope, TenantId, TENANT_HEADER};
use marriage_engine::MarriageProcessor;

const DELETED: &str = "DELETED";

#[derive(Debug, Deserialize)]
struct CharacterStatusEnvelope {
    #[serde(rename = "characterId")]
    character_id: u32,
    #[serde(rename = "type")]
    event_type: String,
}

/// Subscribes to `character_status_topic` and forwards every `DELETED` notice to
/// `MarriageProcessor::handle_character_deletion`; every other event type is ignored.
pub async fn run_character_deletion_consumer<B>(bus: Arc<B>, character_status_topic: String, processor: Arc<MarriageProcessor>, cancel: CancellationToken) -> anyhow::Result<()>
where
    B: BusConsumer + 'static,
{
    let mut subscription = bus
        .subscribe(&character_status_topic)
        .await
        .map_err(|e| anyhow::anyhow!("character-deletion consumer subscribe failed: {e}"))?;

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("character-deletion consumer shutting down");
                return Ok(());
            }
            message = subscription.recv() => message,
        };

        let Some(message) = message else {
            tracing::warn!("character-status bus closed, character-deletion consumer exiting");
            return Ok(());
        };

        let envelope: CharacterStatusEnvelope = match serde_json::from_value(message.body.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed character-status envelope");
                continue;
            }
        };

        if envelope.event_type != DELETED {
            continue;
        }

        let Some(tenant_id) = message.header(TENANT_HEADER).and_then(|raw| raw.parse::<TenantId>().ok()) else {
            tracing::warn!(character_id = envelope.character_id, "discarding DELETED notice with missing or invalid tenant header");
            continue;
        };

        let scope = RequestScope::with_cancel(tenant_id, cancel.clone());
        if let Err(err) = processor.handle_character_deletion(&scope, envelope.character_id).await {
            tracing::error!(tenant_id = %tenant_id, character_id = envelope.character_id, error = %err, "failed to apply character-deletion cascade");
        }
    }
}
