use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    auth::Actor,
    domain::{
        registration::{join_legacy_note, split_legacy_note},
        DepartureStop, ParticipationStatus, Payment, Registration,
    },
    error::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: ParticipationStatus,
    pub departure_stop: Option<DepartureStop>,
    /// Free text; older clients may still prefix it with a legacy stop
    /// marker, which is split off unless an explicit stop was sent.
    pub note: Option<String>,
}

/// Registration plus the prefixed note form kept for clients that predate the
/// `departure_stop` field.
#[derive(Debug, Serialize)]
pub struct RegistrationView {
    #[serde(flatten)]
    pub registration: Registration,
    pub legacy_note: Option<String>,
}

impl From<Registration> for RegistrationView {
    fn from(registration: Registration) -> Self {
        let legacy_note = join_legacy_note(
            registration.departure_stop,
            registration.participation_note.as_deref(),
        );
        Self {
            registration,
            legacy_note,
        }
    }
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((trip_id, participant_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<RegistrationView>> {
    let (stop, note) = match (request.departure_stop, request.note) {
        (Some(stop), note) => (Some(stop), note),
        (None, Some(note)) => {
            let (stop, rest) = split_legacy_note(&note);
            (stop, if rest.is_empty() { None } else { Some(rest) })
        }
        (None, None) => (None, None),
    };

    let registration = state
        .service_context
        .participation_service
        .set_status(&actor, trip_id, participant_id, request.status, stop, note)
        .await?;
    Ok(Json(registration.into()))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((trip_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RegistrationView>> {
    let registration = state
        .service_context
        .participation_service
        .get_registration(&actor, trip_id, participant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;
    Ok(Json(registration.into()))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>> {
    let registration = state
        .service_context
        .registration_repo
        .find_by_id(registration_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;

    crate::auth::ensure_can_act_on_participant(
        &actor,
        registration.participant_id,
        state.service_context.participant_repo.as_ref(),
    )
    .await?;

    let payments = state
        .service_context
        .payment_ledger
        .list_payments(registration_id)
        .await?;
    Ok(Json(payments))
}
