use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::{ensure_can_act_on_participant, Actor},
    domain::{DepartureStop, ParticipationStatus, Registration},
    error::{AppError, Result},
    repository::{
        ParticipantRepository, PaymentRepository, RegistrationRepository, TripRepository,
        UpsertRegistration,
    },
    service::{contract_service::ContractService, payment_generator::PaymentGenerator},
};

/// The participation state machine. Status changes upsert the registration
/// row and, depending on the target state, generate payments, issue the
/// contract, or cancel pending payments. Generation and issuance are
/// best-effort: their failures never fail the status change itself.
pub struct ParticipationService {
    registration_repo: Arc<dyn RegistrationRepository>,
    participant_repo: Arc<dyn ParticipantRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
    trip_repo: Arc<dyn TripRepository>,
    payment_generator: Arc<PaymentGenerator>,
    contract_service: Arc<ContractService>,
}

impl ParticipationService {
    pub fn new(
        registration_repo: Arc<dyn RegistrationRepository>,
        participant_repo: Arc<dyn ParticipantRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        trip_repo: Arc<dyn TripRepository>,
        payment_generator: Arc<PaymentGenerator>,
        contract_service: Arc<ContractService>,
    ) -> Self {
        Self {
            registration_repo,
            participant_repo,
            payment_repo,
            trip_repo,
            payment_generator,
            contract_service,
        }
    }

    pub async fn set_status(
        &self,
        actor: &Actor,
        trip_id: Uuid,
        participant_id: Uuid,
        new_status: ParticipationStatus,
        departure_stop: Option<DepartureStop>,
        note: Option<String>,
    ) -> Result<Registration> {
        ensure_can_act_on_participant(actor, participant_id, self.participant_repo.as_ref())
            .await?;

        self.trip_repo
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
        let participant = self
            .participant_repo
            .find_by_id(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;

        // An admin confirming without picking a stop means the default
        // departure point.
        let departure_stop = match departure_stop {
            None if actor.is_admin() && new_status == ParticipationStatus::Confirmed => {
                Some(DepartureStop::Stop1)
            }
            other => other,
        };

        // Note and stop overwrite on every call: re-confirming with a
        // different stop updates the choice without duplicating obligations.
        let registration = self
            .registration_repo
            .upsert(UpsertRegistration {
                trip_id,
                participant_id,
                participation_status: new_status,
                departure_stop,
                participation_note: note,
            })
            .await?;

        match new_status {
            ParticipationStatus::Confirmed => {
                self.on_confirmed(actor, &registration, &participant).await;
            }
            ParticipationStatus::NotGoing | ParticipationStatus::Unconfirmed => {
                self.on_withdrawn(&registration).await?;
            }
            // Purely informational "can't confirm yet"; must not bill.
            ParticipationStatus::Other => {}
        }

        Ok(registration)
    }

    /// Generate-once side effects. Both guards make repeated confirmations
    /// idempotent for payments and contracts.
    async fn on_confirmed(
        &self,
        actor: &Actor,
        registration: &Registration,
        participant: &crate::domain::Participant,
    ) {
        match self
            .payment_repo
            .count_live_by_registration(registration.id)
            .await
        {
            Ok(0) => {
                if let Err(e) = self
                    .payment_generator
                    .generate_for_registration(registration, participant)
                    .await
                {
                    tracing::error!(
                        registration_id = %registration.id,
                        "Payment generation failed: {}",
                        e
                    );
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    registration_id = %registration.id,
                    "Could not check existing payments: {}",
                    e
                );
            }
        }

        if let Err(e) = self
            .contract_service
            .issue_if_needed(
                registration.trip_id,
                registration.participant_id,
                registration.id,
                actor.id,
            )
            .await
        {
            tracing::error!(
                registration_id = %registration.id,
                "Contract issuance failed: {}",
                e
            );
        }
    }

    /// Cancels only payments still pending. Paid and partially paid rows
    /// stay: a partial payment is never silently voided.
    async fn on_withdrawn(&self, registration: &Registration) -> Result<()> {
        let cancelled = self
            .payment_repo
            .cancel_pending_by_registration(registration.id)
            .await?;
        if cancelled > 0 {
            tracing::info!(
                registration_id = %registration.id,
                cancelled,
                "Cancelled pending payments after withdrawal"
            );
        }
        Ok(())
    }

    pub async fn get_registration(
        &self,
        actor: &Actor,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Registration>> {
        ensure_can_act_on_participant(actor, participant_id, self.participant_repo.as_ref())
            .await?;
        self.registration_repo
            .find_by_trip_and_participant(trip_id, participant_id)
            .await
    }
}
