//! Command consumer: decodes `{characterId, type, body}` envelopes off the command
//! topic, dispatches the literal `type` to the matching Processor operation, and on failure
//! synthesizes a `MARRIAGE_ERROR` event onto the status topic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use marriage_bus::{BusConsumer, BusPublisher};
use marriage_common::{AppError, RequestScope, TenantId, TENANT_HEADER};
use marriage_domain::{CeremonyId, MarriageId, ProposalId};
use marriage_engine::MarriageProcessor;
use marriage_events::provider;

#[derive(Debug, Deserialize)]
struct CommandEnvelope {
    #[serde(rename = "characterId")]
    character_id: u32,
    #[serde(rename = "type")]
    command_type: String,
    body: Value,
}

fn field_u32(body: &Value, field: &str) -> Result<u32, AppError> {
    body.get(field)
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .ok_or_else(|| AppError::Validation(format!("missing or invalid field `{field}`")))
}

fn field_datetime(body: &Value, field: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = body
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation(format!("missing or invalid field `{field}`")))?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Validation(format!("field `{field}` is not RFC3339: {e}")))
}

fn field_u32_vec(body: &Value, field: &str) -> Result<Vec<u32>, AppError> {
    let array = body
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Validation(format!("missing or invalid field `{field}`")))?;
    array
        .iter()
        .map(|v| v.as_u64().map(|n| n as u32).ok_or_else(|| AppError::Validation(format!("field `{field}` has a non-numeric entry"))))
        .collect()
}

/// Maps a command's literal `type` to the spec's `MARRIAGE_ERROR` context label (e.g.
/// `PROPOSE` -> `marriage_proposal`), since the error taxonomy's context strings are a fixed
/// business-action vocabulary distinct from the wire-level command names.
fn error_context(command_type: &str) -> &'static str {
    match command_type {
        "PROPOSE" => "marriage_proposal",
        "ACCEPT" => "proposal_accept",
        "DECLINE" => "proposal_decline",
        "CANCEL" => "proposal_cancel",
        "DIVORCE" => "marriage_divorce",
        "SCHEDULE_CEREMONY" => "ceremony_schedule",
        "START_CEREMONY" => "ceremony_start",
        "COMPLETE_CEREMONY" => "ceremony_complete",
        "CANCEL_CEREMONY" => "ceremony_cancel",
        "POSTPONE_CEREMONY" => "ceremony_postpone",
        "RESCHEDULE_CEREMONY" => "ceremony_reschedule",
        "ADD_INVITEE" => "ceremony_add_invitee",
        "REMOVE_INVITEE" => "ceremony_remove_invitee",
        "ADVANCE_CEREMONY_STATE" => "ceremony_advance_state",
        _ => "marriage_command",
    }
}

/// Runs the `PROPOSE | ACCEPT | DECLINE | ... ` dispatch for one decoded command.
/// Unknown types are silently skipped — another handler on the same
/// topic, or a future command type, may own them.
async fn dispatch(processor: &MarriageProcessor, scope: &RequestScope, character_id: u32, command_type: &str, body: &Value) -> Result<(), AppError> {
    match command_type {
        "PROPOSE" => {
            let target = field_u32(body, "targetCharacterId")?;
            processor.propose(scope, character_id, target).await?;
        }
        "ACCEPT" => {
            let proposal_id = ProposalId(field_u32(body, "proposalId")?);
            processor.accept_proposal(scope, proposal_id).await?;
        }
        "DECLINE" => {
            let proposal_id = ProposalId(field_u32(body, "proposalId")?);
            processor.decline_proposal(scope, proposal_id).await?;
        }
        "CANCEL" => {
            let proposal_id = ProposalId(field_u32(body, "proposalId")?);
            processor.cancel_proposal(scope, proposal_id).await?;
        }
        "DIVORCE" => {
            let marriage_id = MarriageId(field_u32(body, "marriageId")?);
            processor.divorce(scope, marriage_id, character_id).await?;
        }
        "SCHEDULE_CEREMONY" => {
            let marriage_id = MarriageId(field_u32(body, "marriageId")?);
            let scheduled_at = field_datetime(body, "scheduledAt")?;
            let invitees = field_u32_vec(body, "invitees")?;
            processor.schedule_ceremony(scope, marriage_id, scheduled_at, invitees).await?;
        }
        "START_CEREMONY" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            processor.start_ceremony(scope, ceremony_id).await?;
        }
        "COMPLETE_CEREMONY" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            processor.complete_ceremony(scope, ceremony_id).await?;
        }
        "CANCEL_CEREMONY" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            processor.cancel_ceremony(scope, ceremony_id).await?;
        }
        "POSTPONE_CEREMONY" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            processor.postpone_ceremony(scope, ceremony_id).await?;
        }
        "RESCHEDULE_CEREMONY" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            let scheduled_at = field_datetime(body, "scheduledAt")?;
            processor.reschedule_ceremony(scope, ceremony_id, scheduled_at).await?;
        }
        "ADD_INVITEE" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            let invitee = field_u32(body, "characterId")?;
            processor.add_invitee(scope, ceremony_id, invitee).await?;
        }
        "REMOVE_INVITEE" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            let invitee = field_u32(body, "characterId")?;
            processor.remove_invitee(scope, ceremony_id, invitee).await?;
        }
        "ADVANCE_CEREMONY_STATE" => {
            let ceremony_id = CeremonyId(field_u32(body, "ceremonyId")?);
            let next_state = body
                .get("nextState")
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::Validation("missing or invalid field `nextState`".to_string()))?;
            match next_state {
                "ACTIVE" => {
                    processor.start_ceremony(scope, ceremony_id).await?;
                }
                "COMPLETED" => {
                    processor.complete_ceremony(scope, ceremony_id).await?;
                }
                "CANCELLED" => {
                    processor.cancel_ceremony(scope, ceremony_id).await?;
                }
                "POSTPONED" => {
                    processor.postpone_ceremony(scope, ceremony_id).await?;
                }
                other => {
                    return Err(AppError::InvalidStateTransition(format!("unsupported nextState `{other}` for ADVANCE_CEREMONY_STATE")));
                }
            }
        }
        _ => {
            tracing::debug!(command_type, "command consumer skipping unrecognized command type");
        }
    }
    Ok(())
}

/// Subscribes to `command_topic` and runs the decode-dispatch-error loop until `cancel` fires,
/// a message-driven counterpart to the interval-driven sweeper loops.
pub async fn run_command_consumer<B>(bus: Arc<B>, command_topic: String, event_topic: String, processor: Arc<MarriageProcessor>, cancel: CancellationToken) -> anyhow::Result<()>
where
    B: BusConsumer + BusPublisher + 'static,
{
    let mut subscription = bus.subscribe(&command_topic).await.map_err(|e| anyhow::anyhow!("command consumer subscribe failed: {e}"))?;

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("command consumer shutting down");
                return Ok(());
            }
            message = subscription.recv() => message,
        };

        let Some(message) = message else {
            tracing::warn!("command bus closed, command consumer exiting");
            return Ok(());
        };

        let envelope: CommandEnvelope = match serde_json::from_value(message.body.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed command envelope");
                continue;
            }
        };

        let tenant_id = match message.header(TENANT_HEADER).and_then(|raw| raw.parse::<TenantId>().ok()) {
            Some(tenant_id) => tenant_id,
            None => {
                tracing::warn!(character_id = envelope.character_id, command_type = %envelope.command_type, "discarding command with missing or invalid tenant header");
                continue;
            }
        };

        let scope = RequestScope::with_cancel(tenant_id, cancel.clone());
        if let Err(err) = dispatch(&processor, &scope, envelope.character_id, &envelope.command_type, &envelope.body).await {
            tracing::warn!(tenant_id = %tenant_id, character_id = envelope.character_id, command_type = %envelope.command_type, error = %err, "command failed");
            let error_event = provider::marriage_error(&event_topic, envelope.character_id, &err, error_context(&envelope.command_type), Utc::now());
            if let Err(publish_err) = bus.publish(error_event).await {
                tracing::error!(error = %publish_err, "failed to emit MARRIAGE_ERROR event");
            }
        }
    }
}
