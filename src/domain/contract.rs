use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An issued agreement for one (trip, participant) pair. The body is a fully
/// rendered snapshot; later template edits never reach an issued contract.
/// The only mutation after insert is guardian acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub participant_id: Uuid,
    pub registration_id: Uuid,
    /// Sequential per calendar year, formatted "N/YYYY".
    pub contract_number: String,
    pub body: String,
    pub issued_by: Uuid,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Editable source text a trip's contracts are rendered from. One per trip,
/// upserted on trip_id. Issuance only fires while `is_active` is set;
/// deactivating stops future contracts without retracting existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub body: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertContractTemplateRequest {
    pub body: String,
    pub is_active: bool,
}
