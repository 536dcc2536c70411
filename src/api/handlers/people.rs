use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    auth::Actor,
    domain::{CreateGuardianRequest, CreateParticipantRequest, Guardian, Participant},
    error::{AppError, Result},
};

pub async fn create_guardian(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateGuardianRequest>,
) -> Result<(StatusCode, Json<Guardian>)> {
    actor.require_admin()?;
    if let Some(existing) = state
        .service_context
        .guardian_repo
        .find_by_email(&request.email)
        .await?
    {
        return Err(AppError::Conflict(format!(
            "Guardian with email {} already exists",
            existing.email
        )));
    }
    let guardian = state.service_context.guardian_repo.create(request).await?;
    Ok((StatusCode::CREATED, Json(guardian)))
}

pub async fn create_participant(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateParticipantRequest>,
) -> Result<(StatusCode, Json<Participant>)> {
    actor.require_admin()?;
    state
        .service_context
        .guardian_repo
        .find_by_id(request.guardian_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Guardian not found".to_string()))?;
    let participant = state
        .service_context
        .participant_repo
        .create(request)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

pub async fn list_own_participants(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<Participant>>> {
    let participants = state
        .service_context
        .participant_repo
        .list_by_guardian(actor.id)
        .await?;
    Ok(Json(participants))
}

pub async fn get_participant(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Participant>> {
    crate::auth::ensure_can_act_on_participant(
        &actor,
        id,
        state.service_context.participant_repo.as_ref(),
    )
    .await?;
    let participant = state
        .service_context
        .participant_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
    Ok(Json(participant))
}
