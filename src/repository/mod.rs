use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod contract_repository;
pub mod participant_repository;
pub mod payment_repository;
pub mod payment_template_repository;
pub mod registration_repository;
pub mod trip_repository;

pub use contract_repository::{SqliteContractRepository, SqliteContractTemplateRepository};
pub use participant_repository::{SqliteGuardianRepository, SqliteParticipantRepository};
pub use payment_repository::SqlitePaymentRepository;
pub use payment_template_repository::SqlitePaymentTemplateRepository;
pub use registration_repository::SqliteRegistrationRepository;
pub use trip_repository::SqliteTripRepository;

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create(&self, trip: CreateTripRequest) -> Result<Trip>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>>;
    async fn list(&self) -> Result<Vec<Trip>>;
    /// Trips whose return date has not yet passed, resolved against the
    /// clock at call time.
    async fn list_active(&self) -> Result<Vec<Trip>>;
    async fn list_completed(&self) -> Result<Vec<Trip>>;
    async fn update(&self, id: Uuid, update: UpdateTripRequest) -> Result<Trip>;
    /// Explicit cascade: contracts, transactions, payments, registrations,
    /// templates, then the trip itself.
    async fn delete_cascade(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait GuardianRepository: Send + Sync {
    async fn create(&self, guardian: CreateGuardianRequest) -> Result<Guardian>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guardian>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Guardian>>;
}

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn create(&self, participant: CreateParticipantRequest) -> Result<Participant>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>>;
    async fn list_by_guardian(&self, guardian_id: Uuid) -> Result<Vec<Participant>>;
}

#[async_trait]
pub trait PaymentTemplateRepository: Send + Sync {
    async fn create(&self, trip_id: Uuid, template: CreatePaymentTemplateRequest)
        -> Result<PaymentTemplate>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentTemplate>>;
    async fn list_by_trip(&self, trip_id: Uuid) -> Result<Vec<PaymentTemplate>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

pub struct UpsertRegistration {
    pub trip_id: Uuid,
    pub participant_id: Uuid,
    pub participation_status: ParticipationStatus,
    pub departure_stop: Option<DepartureStop>,
    pub participation_note: Option<String>,
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>>;
    async fn find_by_trip_and_participant(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Registration>>;
    async fn list_by_trip(&self, trip_id: Uuid) -> Result<Vec<Registration>>;
    /// Insert-or-update keyed on (trip_id, participant_id). Note and stop
    /// overwrite on every call; repeated upserts never create a second row.
    async fn upsert(&self, registration: UpsertRegistration) -> Result<Registration>;
}

/// Ledger column updates applied together with the transaction insert.
pub struct LedgerUpdate {
    pub amount_paid_cents: i64,
    pub status: PaymentStatus,
    pub paid_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Bulk insert inside a single transaction. A unique-constraint conflict
    /// on (registration_id, template_id) rolls the whole batch back and is
    /// reported as `Ok(false)`: another caller generated first.
    async fn create_batch(&self, payments: Vec<Payment>) -> Result<bool>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn list_by_registration(&self, registration_id: Uuid) -> Result<Vec<Payment>>;
    async fn count_live_by_registration(&self, registration_id: Uuid) -> Result<i64>;
    /// Cancels payments still in Pending; paid and partially paid rows are
    /// left untouched. Returns the number of rows cancelled.
    async fn cancel_pending_by_registration(&self, registration_id: Uuid) -> Result<u64>;
    async fn apply_ledger_update(&self, id: Uuid, update: LedgerUpdate) -> Result<Payment>;
    async fn update_amount_and_discount(
        &self,
        id: Uuid,
        amount_cents: i64,
        discount_percentage: f64,
    ) -> Result<Payment>;
    async fn insert_transaction(&self, tx: PaymentTransaction) -> Result<PaymentTransaction>;
    async fn list_transactions(&self, payment_id: Uuid) -> Result<Vec<PaymentTransaction>>;
}

#[async_trait]
pub trait ContractTemplateRepository: Send + Sync {
    async fn upsert(&self, trip_id: Uuid, template: UpsertContractTemplateRequest)
        -> Result<ContractTemplate>;
    async fn find_by_trip(&self, trip_id: Uuid) -> Result<Option<ContractTemplate>>;
}

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn create(&self, contract: Contract) -> Result<Contract>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>>;
    async fn find_by_trip_and_participant(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Contract>>;
    async fn exists_for_trip_and_participant(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<bool>;
    /// Atomic increment-and-read of the per-year contract counter.
    async fn next_contract_number(&self, year: i32) -> Result<i64>;
    async fn mark_accepted(&self, id: Uuid, accepted_by: Uuid) -> Result<Contract>;
}
