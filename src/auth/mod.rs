//! Actor identity handed to the service layer.
//!
//! Session handling lives in the fronting auth proxy; by the time a request
//! reaches us it carries a resolved actor id and role. Ownership checks on
//! top of that role are done here against the participant's guardian.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    repository::ParticipantRepository,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Guardian,
}

#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Admins act on anyone; guardians only on participants they own.
/// Returns the violation before any mutation happens.
pub async fn ensure_can_act_on_participant(
    actor: &Actor,
    participant_id: Uuid,
    participants: &dyn ParticipantRepository,
) -> Result<()> {
    if actor.is_admin() {
        return Ok(());
    }

    let participant = participants
        .find_by_id(participant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;

    if participant.guardian_id != actor.id {
        return Err(AppError::Forbidden);
    }

    Ok(())
}
