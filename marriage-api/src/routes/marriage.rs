use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;

use marriage_domain::{Ceremony, Marriage};

use crate::error::ApiError;
use crate::extract::TenantScope;
use crate::state::ApiState;

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/{characterId}/marriage", get(current_marriage))
        .route("/{characterId}/marriage/history", get(marriage_history))
        .route("/{characterId}/marriage/proposals", get(pending_proposals))
}

fn marriage_json(marriage: &Marriage, ceremony: Option<&Ceremony>) -> serde_json::Value {
    json!({
        "id": marriage.id.0,
        "characterId1": marriage.character_id_1,
        "characterId2": marriage.character_id_2,
        "status": marriage.status,
        "engagedAt": marriage.engaged_at,
        "marriedAt": marriage.married_at,
        "divorcedAt": marriage.divorced_at,
        "ceremony": ceremony.map(ceremony_json),
    })
}

fn ceremony_json(ceremony: &Ceremony) -> serde_json::Value {
    json!({
        "id": ceremony.id.0,
        "marriageId": ceremony.marriage_id.0,
        "status": ceremony.status,
        "scheduledAt": ceremony.scheduled_at,
        "startedAt": ceremony.started_at,
        "completedAt": ceremony.completed_at,
        "invitees": ceremony.invitees,
    })
}

/// `GET /characters/{characterId}/marriage`: current non-terminal marriage, 404 if none.
async fn current_marriage(State(state): State<ApiState>, TenantScope(scope): TenantScope, Path(character_id): Path<u32>) -> Result<impl IntoResponse, ApiError> {
    let view = state.processor.current_marriage(&scope, character_id).await?;
    match view {
        Some(view) => Ok(Json(json!({
            "success": true,
            "marriage": marriage_json(&view.marriage, view.ceremony.as_ref()),
        }))),
        None => Err(marriage_common::AppError::MarriageNotFound.into()),
    }
}

/// `GET /characters/{characterId}/marriage/history`: every marriage the character has
/// ever been part of, newest first.
async fn marriage_history(State(state): State<ApiState>, TenantScope(scope): TenantScope, Path(character_id): Path<u32>) -> Result<impl IntoResponse, ApiError> {
    let marriages = state.processor.marriage_history(&scope, character_id).await?;
    Ok(Json(json!({
        "success": true,
        "marriages": marriages.iter().map(|m| marriage_json(m, None)).collect::<Vec<_>>(),
    })))
}

/// `GET /characters/{characterId}/marriage/proposals`: Pending proposals where the
/// character is proposer or target.
async fn pending_proposals(State(state): State<ApiState>, TenantScope(scope): TenantScope, Path(character_id): Path<u32>) -> Result<impl IntoResponse, ApiError> {
    let proposals = state.processor.pending_proposals(&scope, character_id).await?;
    let proposals: Vec<_> = proposals
        .iter()
        .map(|p| {
            json!({
                "id": p.id.0,
                "proposerId": p.proposer_id,
                "targetId": p.target_id,
                "status": p.status,
                "proposedAt": p.proposed_at,
                "expiresAt": p.expires_at,
            })
        })
        .collect();
    Ok(Json(json!({ "success": true, "proposals": proposals })))
}
