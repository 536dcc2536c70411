use axum::{
    extract::{Extension, Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    auth::Actor,
    domain::Contract,
    error::{AppError, Result},
};

pub async fn get_for_participant(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((trip_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Contract>> {
    let contract = state
        .service_context
        .contract_service
        .find_for_participant(&actor, trip_id, participant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Contract not found".to_string()))?;
    Ok(Json(contract))
}

pub async fn accept(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Contract>> {
    let contract = state
        .service_context
        .contract_service
        .accept(&actor, contract_id)
        .await?;
    Ok(Json(contract))
}
