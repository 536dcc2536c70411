pub mod contract_render;
pub mod contract_service;
pub mod participation_service;
pub mod payment_generator;
pub mod payment_ledger;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::notifications::Mailer;
use crate::repository::*;
use contract_service::ContractService;
use participation_service::ParticipationService;
use payment_generator::PaymentGenerator;
use payment_ledger::PaymentLedger;

pub struct ServiceContext {
    pub trip_repo: Arc<dyn TripRepository>,
    pub guardian_repo: Arc<dyn GuardianRepository>,
    pub participant_repo: Arc<dyn ParticipantRepository>,
    pub payment_template_repo: Arc<dyn PaymentTemplateRepository>,
    pub registration_repo: Arc<dyn RegistrationRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub contract_repo: Arc<dyn ContractRepository>,
    pub contract_template_repo: Arc<dyn ContractTemplateRepository>,
    pub participation_service: Arc<ParticipationService>,
    pub payment_ledger: Arc<PaymentLedger>,
    pub contract_service: Arc<ContractService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, mailer: Arc<dyn Mailer>) -> Self {
        let trip_repo: Arc<dyn TripRepository> =
            Arc::new(SqliteTripRepository::new(db_pool.clone()));
        let guardian_repo: Arc<dyn GuardianRepository> =
            Arc::new(SqliteGuardianRepository::new(db_pool.clone()));
        let participant_repo: Arc<dyn ParticipantRepository> =
            Arc::new(SqliteParticipantRepository::new(db_pool.clone()));
        let payment_template_repo: Arc<dyn PaymentTemplateRepository> =
            Arc::new(SqlitePaymentTemplateRepository::new(db_pool.clone()));
        let registration_repo: Arc<dyn RegistrationRepository> =
            Arc::new(SqliteRegistrationRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let contract_repo: Arc<dyn ContractRepository> =
            Arc::new(SqliteContractRepository::new(db_pool.clone()));
        let contract_template_repo: Arc<dyn ContractTemplateRepository> =
            Arc::new(SqliteContractTemplateRepository::new(db_pool.clone()));

        let payment_generator = Arc::new(PaymentGenerator::new(
            payment_template_repo.clone(),
            payment_repo.clone(),
        ));
        let contract_service = Arc::new(ContractService::new(
            contract_repo.clone(),
            contract_template_repo.clone(),
            payment_template_repo.clone(),
            registration_repo.clone(),
            participant_repo.clone(),
            guardian_repo.clone(),
            trip_repo.clone(),
        ));
        let participation_service = Arc::new(ParticipationService::new(
            registration_repo.clone(),
            participant_repo.clone(),
            payment_repo.clone(),
            trip_repo.clone(),
            payment_generator,
            contract_service.clone(),
        ));
        let payment_ledger = Arc::new(PaymentLedger::new(
            payment_repo.clone(),
            registration_repo.clone(),
            participant_repo.clone(),
            guardian_repo.clone(),
            trip_repo.clone(),
            mailer,
        ));

        Self {
            trip_repo,
            guardian_repo,
            participant_repo,
            payment_template_repo,
            registration_repo,
            payment_repo,
            contract_repo,
            contract_template_repo,
            participation_service,
            payment_ledger,
            contract_service,
            db_pool,
        }
    }
}
