//! Pure functions that shape outgoing event envelopes. None of these touch the bus,
//! the clock, or the store — given the same arguments they always produce the same message, so
//! the Processor can unit-test the shape of what it is about to emit without a bus in the loop.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use marriage_common::AppError;
use marriage_domain::{Ceremony, CharacterId, Marriage, MarriageId, Proposal};

use marriage_bus::BusMessage;

use crate::kind;

/// Wraps a body in the `{characterId, type, body}` envelope shared by commands and events,
/// keyed for partitioning by `character_id` so delivery stays ordered per character.
fn envelope(topic: &str, character_id: CharacterId, event_type: &str, body: Value) -> BusMessage {
    BusMessage::new(
        topic,
        character_id.to_string(),
        json!({
            "characterId": character_id,
            "type": event_type,
            "body": body,
        }),
    )
}

pub fn proposal_created(topic: &str, proposal: &Proposal) -> BusMessage {
    envelope(
        topic,
        proposal.proposer_id,
        kind::PROPOSAL_CREATED,
        json!({
            "proposalId": proposal.id.0,
            "proposerId": proposal.proposer_id,
            "targetId": proposal.target_id,
            "proposedAt": proposal.proposed_at.to_rfc3339(),
            "expiresAt": proposal.expires_at.to_rfc3339(),
        }),
    )
}

pub fn proposal_accepted(topic: &str, proposal: &Proposal) -> BusMessage {
    envelope(
        topic,
        proposal.proposer_id,
        kind::PROPOSAL_ACCEPTED,
        json!({
            "proposalId": proposal.id.0,
            "proposerId": proposal.proposer_id,
            "targetId": proposal.target_id,
            "respondedAt": proposal.responded_at.map(|t| t.to_rfc3339()),
        }),
    )
}

pub fn proposal_declined(topic: &str, proposal: &Proposal) -> BusMessage {
    envelope(
        topic,
        proposal.proposer_id,
        kind::PROPOSAL_DECLINED,
        json!({
            "proposalId": proposal.id.0,
            "proposerId": proposal.proposer_id,
            "targetId": proposal.target_id,
            "respondedAt": proposal.responded_at.map(|t| t.to_rfc3339()),
            "rejectionCount": proposal.rejection_count,
            "cooldownUntil": proposal.cooldown_until.map(|t| t.to_rfc3339()),
        }),
    )
}

pub fn proposal_cancelled(topic: &str, proposal: &Proposal) -> BusMessage {
    envelope(
        topic,
        proposal.proposer_id,
        kind::PROPOSAL_CANCELLED,
        json!({
            "proposalId": proposal.id.0,
            "proposerId": proposal.proposer_id,
            "targetId": proposal.target_id,
        }),
    )
}

pub fn proposal_expired(topic: &str, proposal: &Proposal) -> BusMessage {
    envelope(
        topic,
        proposal.proposer_id,
        kind::PROPOSAL_EXPIRED,
        json!({
            "proposalId": proposal.id.0,
            "proposerId": proposal.proposer_id,
            "targetId": proposal.target_id,
            "expiresAt": proposal.expires_at.to_rfc3339(),
        }),
    )
}

/// `status` distinguishes the engagement-time `MARRIAGE_CREATED` from the ceremony-completion
/// one: both use this event type, disambiguated by the `status` body field.
pub fn marriage_created(topic: &str, marriage: &Marriage, status: &str) -> BusMessage {
    envelope(
        topic,
        marriage.character_id_1,
        kind::MARRIAGE_CREATED,
        json!({
            "marriageId": marriage.id.0,
            "characterId1": marriage.character_id_1,
            "characterId2": marriage.character_id_2,
            "status": status,
            "engagedAt": marriage.engaged_at.map(|t| t.to_rfc3339()),
            "marriedAt": marriage.married_at.map(|t| t.to_rfc3339()),
        }),
    )
}

pub fn marriage_divorced(topic: &str, marriage: &Marriage, initiated_by: CharacterId) -> BusMessage {
    envelope(
        topic,
        marriage.character_id_1,
        kind::MARRIAGE_DIVORCED,
        json!({
            "marriageId": marriage.id.0,
            "characterId1": marriage.character_id_1,
            "characterId2": marriage.character_id_2,
            "initiatedBy": initiated_by,
            "divorcedAt": marriage.divorced_at.map(|t| t.to_rfc3339()),
        }),
    )
}

pub fn marriage_deleted(topic: &str, marriage: &Marriage, initiated_by: CharacterId, reason: &str) -> BusMessage {
    envelope(
        topic,
        marriage.character_id_1,
        kind::MARRIAGE_DELETED,
        json!({
            "marriageId": marriage.id.0,
            "characterId1": marriage.character_id_1,
            "characterId2": marriage.character_id_2,
            "initiatedBy": initiated_by,
            "reason": reason,
        }),
    )
}

pub fn ceremony_scheduled(topic: &str, ceremony: &Ceremony) -> BusMessage {
    ceremony_event(topic, ceremony, kind::CEREMONY_SCHEDULED, json!({}))
}

pub fn ceremony_started(topic: &str, ceremony: &Ceremony) -> BusMessage {
    ceremony_event(topic, ceremony, kind::CEREMONY_STARTED, json!({}))
}

pub fn ceremony_completed(topic: &str, ceremony: &Ceremony) -> BusMessage {
    ceremony_event(topic, ceremony, kind::CEREMONY_COMPLETED, json!({}))
}

pub fn ceremony_postponed(topic: &str, ceremony: &Ceremony, reason: &str) -> BusMessage {
    ceremony_event(topic, ceremony, kind::CEREMONY_POSTPONED, json!({"reason": reason}))
}

pub fn ceremony_cancelled(topic: &str, ceremony: &Ceremony, reason: &str) -> BusMessage {
    ceremony_event(topic, ceremony, kind::CEREMONY_CANCELLED, json!({"reason": reason}))
}

pub fn ceremony_rescheduled(topic: &str, ceremony: &Ceremony) -> BusMessage {
    ceremony_event(topic, ceremony, kind::CEREMONY_RESCHEDULED, json!({}))
}

fn ceremony_event(topic: &str, ceremony: &Ceremony, event_type: &str, extra: Value) -> BusMessage {
    let mut body = json!({
        "ceremonyId": ceremony.id.0,
        "marriageId": ceremony.marriage_id.0,
        "characterId1": ceremony.character_id_1,
        "characterId2": ceremony.character_id_2,
        "status": status_str(ceremony),
        "scheduledAt": ceremony.scheduled_at.to_rfc3339(),
        "startedAt": ceremony.started_at.map(|t| t.to_rfc3339()),
        "completedAt": ceremony.completed_at.map(|t| t.to_rfc3339()),
        "invitees": ceremony.invitees,
    });
    if let (Some(body_obj), Some(extra_obj)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            body_obj.insert(k.clone(), v.clone());
        }
    }
    envelope(topic, ceremony.character_id_1, event_type, body)
}

fn status_str(ceremony: &Ceremony) -> &'static str {
    use marriage_domain::CeremonyStatus::*;
    match ceremony.status {
        Scheduled => "SCHEDULED",
        Active => "ACTIVE",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
        Postponed => "POSTPONED",
    }
}

pub fn invitee_added(topic: &str, ceremony: &Ceremony, character_id: CharacterId) -> BusMessage {
    ceremony_event(topic, ceremony, kind::INVITEE_ADDED, json!({"characterId": character_id}))
}

pub fn invitee_removed(topic: &str, ceremony: &Ceremony, character_id: CharacterId) -> BusMessage {
    ceremony_event(topic, ceremony, kind::INVITEE_REMOVED, json!({"characterId": character_id}))
}

/// Synthesizes the `MARRIAGE_ERROR` event the command consumer emits when a Processor call
/// fails: `{errorType, errorCode, message, context, timestamp}`.
pub fn marriage_error(topic: &str, character_id: CharacterId, err: &AppError, context: &str, now: DateTime<Utc>) -> BusMessage {
    envelope(
        topic,
        character_id,
        kind::MARRIAGE_ERROR,
        json!({
            "errorType": err.error_type(),
            "errorCode": err.error_code(),
            "message": err.to_string(),
            "context": context,
            "timestamp": now.to_rfc3339(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use marriage_common::TenantId;
    use marriage_domain::{CeremonyId, MarriageId as MId, ProposalId};
    use uuid::Uuid;

    fn tenant() -> TenantId {
        TenantId::new(Uuid::new_v4())
    }

    #[test]
    fn proposal_created_keys_by_proposer() {
        let now = Utc::now();
        let proposal = Proposal::propose(ProposalId(1), tenant(), 10, 20, now).unwrap();
        let message = proposal_created("marriage.status", &proposal);
        assert_eq!(message.key, "10");
        assert_eq!(message.body["type"], kind::PROPOSAL_CREATED);
        assert_eq!(message.body["body"]["targetId"], 20);
    }

    #[test]
    fn marriage_created_carries_status_field() {
        let now = Utc::now();
        let marriage = Marriage::propose(MId(1), tenant(), 1, 2, now).unwrap().engage(now).unwrap();
        let message = marriage_created("marriage.status", &marriage, "engaged");
        assert_eq!(message.body["body"]["status"], "engaged");
    }

    #[test]
    fn ceremony_event_keys_by_character_1() {
        let now = Utc::now();
        let ceremony = Ceremony::schedule(CeremonyId(1), tenant(), MId(1), 7, 8, now, vec![], now).unwrap();
        let message = ceremony_scheduled("marriage.status", &ceremony);
        assert_eq!(message.key, "7");
    }

    #[test]
    fn marriage_error_carries_taxonomy_fields() {
        let now = Utc::now();
        let message = marriage_error("marriage.status", 42, &AppError::InsufficientLevel, "marriage_proposal", now);
        assert_eq!(message.body["body"]["errorCode"], "INSUFFICIENT_LEVEL");
        assert_eq!(message.body["body"]["errorType"], "ELIGIBILITY");
        assert_eq!(message.body["body"]["context"], "marriage_proposal");
    }
}
