use std::sync::Arc;

use chrono::{Datelike, Utc};
use uuid::Uuid;

use crate::{
    auth::{ensure_can_act_on_participant, Actor},
    domain::{Contract, RegistrationStatus},
    error::{AppError, Result},
    repository::{
        ContractRepository, ContractTemplateRepository, GuardianRepository,
        ParticipantRepository, PaymentTemplateRepository, RegistrationRepository, TripRepository,
    },
    service::contract_render::{
        format_bank_accounts, format_payment_schedule, render, RenderContext,
        PREVIEW_CONTRACT_NUMBER,
    },
};

/// One-shot contract generation plus preview and guardian acceptance.
/// Issuance renders the trip's active template into an immutable snapshot;
/// once a contract exists for a (trip, participant) pair it is never touched
/// again except for acceptance.
pub struct ContractService {
    contract_repo: Arc<dyn ContractRepository>,
    contract_template_repo: Arc<dyn ContractTemplateRepository>,
    payment_template_repo: Arc<dyn PaymentTemplateRepository>,
    registration_repo: Arc<dyn RegistrationRepository>,
    participant_repo: Arc<dyn ParticipantRepository>,
    guardian_repo: Arc<dyn GuardianRepository>,
    trip_repo: Arc<dyn TripRepository>,
}

impl ContractService {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        contract_template_repo: Arc<dyn ContractTemplateRepository>,
        payment_template_repo: Arc<dyn PaymentTemplateRepository>,
        registration_repo: Arc<dyn RegistrationRepository>,
        participant_repo: Arc<dyn ParticipantRepository>,
        guardian_repo: Arc<dyn GuardianRepository>,
        trip_repo: Arc<dyn TripRepository>,
    ) -> Self {
        Self {
            contract_repo,
            contract_template_repo,
            payment_template_repo,
            registration_repo,
            participant_repo,
            guardian_repo,
            trip_repo,
        }
    }

    /// Safe to call speculatively: without an active template, or with a
    /// contract already on file, this is a no-op.
    pub async fn issue_if_needed(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
        registration_id: Uuid,
        issued_by: Uuid,
    ) -> Result<Option<Contract>> {
        let template = match self.contract_template_repo.find_by_trip(trip_id).await? {
            Some(template) if template.is_active => template,
            _ => return Ok(None),
        };

        if self
            .contract_repo
            .exists_for_trip_and_participant(trip_id, participant_id)
            .await?
        {
            return Ok(None);
        }

        let trip = self
            .trip_repo
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
        let participant = self
            .participant_repo
            .find_by_id(participant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
        let guardian = self
            .guardian_repo
            .find_by_id(participant.guardian_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Guardian not found".to_string()))?;
        let payment_templates = self.payment_template_repo.list_by_trip(trip_id).await?;

        let now = Utc::now();
        let year = now.year();
        let sequence = self.contract_repo.next_contract_number(year).await?;
        let contract_number = format!("{}/{}", sequence, year);

        let ctx = RenderContext {
            trip_title: trip.title.clone(),
            trip_location: trip.location.clone(),
            departure_date: trip.departure_at.format("%Y-%m-%d").to_string(),
            return_date: trip.return_at.format("%Y-%m-%d").to_string(),
            guardian_name: guardian.full_name(),
            guardian_address: guardian.address.clone().unwrap_or_default(),
            guardian_pesel: guardian.pesel.clone().unwrap_or_default(),
            guardian_phone: guardian.phone.clone().unwrap_or_default(),
            child_name: participant.full_name(),
            child_birth_date: participant.birth_date.format("%Y-%m-%d").to_string(),
            bank_accounts: format_bank_accounts(&trip),
            payment_schedule: format_payment_schedule(&payment_templates),
            contract_number: contract_number.clone(),
            issue_date: now.format("%Y-%m-%d").to_string(),
        };

        let contract = self
            .contract_repo
            .create(Contract {
                id: Uuid::new_v4(),
                trip_id,
                participant_id,
                registration_id,
                contract_number,
                body: render(&template.body, &ctx),
                issued_by,
                accepted_at: None,
                accepted_by: None,
                created_at: now,
            })
            .await?;

        tracing::info!(
            trip_id = %trip_id,
            participant_id = %participant_id,
            contract_number = %contract.contract_number,
            "Issued contract"
        );
        Ok(Some(contract))
    }

    /// Renders an arbitrary draft body against the first active registration
    /// on the trip, or against placeholder tokens when none exists. Persists
    /// nothing and allocates no number.
    pub async fn preview(&self, trip_id: Uuid, draft_body: &str) -> Result<String> {
        let trip = self
            .trip_repo
            .find_by_id(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
        let payment_templates = self.payment_template_repo.list_by_trip(trip_id).await?;
        let schedule = format_payment_schedule(&payment_templates);

        let registration = self
            .registration_repo
            .list_by_trip(trip_id)
            .await?
            .into_iter()
            .find(|r| r.status == RegistrationStatus::Active);

        let ctx = match registration {
            Some(registration) => {
                let participant = self
                    .participant_repo
                    .find_by_id(registration.participant_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Participant not found".to_string()))?;
                let guardian = self
                    .guardian_repo
                    .find_by_id(participant.guardian_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Guardian not found".to_string()))?;

                RenderContext {
                    trip_title: trip.title.clone(),
                    trip_location: trip.location.clone(),
                    departure_date: trip.departure_at.format("%Y-%m-%d").to_string(),
                    return_date: trip.return_at.format("%Y-%m-%d").to_string(),
                    guardian_name: guardian.full_name(),
                    guardian_address: guardian.address.clone().unwrap_or_default(),
                    guardian_pesel: guardian.pesel.clone().unwrap_or_default(),
                    guardian_phone: guardian.phone.clone().unwrap_or_default(),
                    child_name: participant.full_name(),
                    child_birth_date: participant.birth_date.format("%Y-%m-%d").to_string(),
                    bank_accounts: format_bank_accounts(&trip),
                    payment_schedule: schedule,
                    contract_number: PREVIEW_CONTRACT_NUMBER.to_string(),
                    issue_date: Utc::now().format("%Y-%m-%d").to_string(),
                }
            }
            None => RenderContext::placeholder(&trip, schedule),
        };

        Ok(render(draft_body, &ctx))
    }

    pub async fn find_for_participant(
        &self,
        actor: &Actor,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Contract>> {
        ensure_can_act_on_participant(actor, participant_id, self.participant_repo.as_ref())
            .await?;
        self.contract_repo
            .find_by_trip_and_participant(trip_id, participant_id)
            .await
    }

    /// Guardian acceptance, the only mutation a contract sees after issue.
    pub async fn accept(&self, actor: &Actor, contract_id: Uuid) -> Result<Contract> {
        let contract = self
            .contract_repo
            .find_by_id(contract_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contract not found".to_string()))?;

        ensure_can_act_on_participant(
            actor,
            contract.participant_id,
            self.participant_repo.as_ref(),
        )
        .await?;

        if contract.accepted_at.is_some() {
            return Err(AppError::Conflict(
                "Contract has already been accepted".to_string(),
            ));
        }

        self.contract_repo.mark_accepted(contract_id, actor.id).await
    }
}
