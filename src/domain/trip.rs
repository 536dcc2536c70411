use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub status: TripStatus,
    pub departure_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
    /// Primary boarding point, always present.
    pub primary_stop: String,
    /// Optional secondary boarding point on the same route.
    pub secondary_stop: Option<String>,
    /// Group names eligible to register for this trip.
    pub eligible_groups: Vec<String>,
    pub bank_accounts: Vec<BankAccount>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "TEXT")]
pub enum TripStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub label: String,
    pub account_number: String,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum Currency {
    PLN,
    EUR,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::PLN => write!(f, "PLN"),
            Currency::EUR => write!(f, "EUR"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTripRequest {
    pub title: String,
    pub location: String,
    pub departure_at: DateTime<Utc>,
    pub return_at: DateTime<Utc>,
    pub primary_stop: String,
    pub secondary_stop: Option<String>,
    #[serde(default)]
    pub eligible_groups: Vec<String>,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTripRequest {
    pub title: Option<String>,
    pub location: Option<String>,
    pub status: Option<TripStatus>,
    pub departure_at: Option<DateTime<Utc>>,
    pub return_at: Option<DateTime<Utc>>,
    pub primary_stop: Option<String>,
    pub secondary_stop: Option<Option<String>>,
    pub eligible_groups: Option<Vec<String>>,
    pub bank_accounts: Option<Vec<BankAccount>>,
}
