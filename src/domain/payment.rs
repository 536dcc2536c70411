use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Currency;

/// Admin-authored planned charge for a trip. Templates are decoupled from the
/// payments generated off them: editing or deleting a template never touches
/// already-created Payment rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTemplate {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub payment_type: PaymentType,
    pub installment_number: Option<i32>,
    pub is_first_installment: bool,
    pub includes_season_pass: bool,
    pub category_name: Option<String>,
    /// Inclusive birth-year eligibility window, season passes only.
    /// A missing bound is unbounded on that side.
    pub birth_year_from: Option<i32>,
    pub birth_year_to: Option<i32>,
    pub amount_cents: i64,
    pub currency: Currency,
    /// None means "payable by agreement".
    pub due_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTemplate {
    /// Season passes are limited to a birth-year window; everything else
    /// applies to every participant.
    pub fn eligible_for_birth_year(&self, birth_year: i32) -> bool {
        if self.payment_type != PaymentType::SeasonPass {
            return true;
        }
        let from_ok = self.birth_year_from.map_or(true, |from| birth_year >= from);
        let to_ok = self.birth_year_to.map_or(true, |to| birth_year <= to);
        from_ok && to_ok
    }

    /// Human-readable label used on contracts and in notification mail.
    pub fn label(&self) -> String {
        payment_label(self.payment_type, self.installment_number, self.category_name.as_deref())
    }
}

fn payment_label(
    payment_type: PaymentType,
    installment_number: Option<i32>,
    category_name: Option<&str>,
) -> String {
    if let Some(name) = category_name {
        return name.to_string();
    }
    match payment_type {
        PaymentType::Installment => match installment_number {
            Some(n) => format!("Installment {}", n),
            None => "Installment".to_string(),
        },
        PaymentType::SeasonPass => "Season pass".to_string(),
        PaymentType::Full => "Full payment".to_string(),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentType {
    Installment,
    SeasonPass,
    Full,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Both,
}

/// A concrete billing obligation for one registration, instantiated from a
/// template by the payment generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub registration_id: Uuid,
    /// Originating template; None once the template has been deleted.
    pub template_id: Option<Uuid>,
    pub payment_type: PaymentType,
    pub installment_number: Option<i32>,
    pub category_name: Option<String>,
    /// Baseline set at generation time, never changed afterwards.
    pub original_amount_cents: i64,
    /// Current amount owed, post-discount.
    pub amount_cents: i64,
    pub currency: Currency,
    pub due_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    pub amount_paid_cents: i64,
    pub discount_percentage: f64,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn remaining_cents(&self) -> i64 {
        (self.amount_cents - self.amount_paid_cents).max(0)
    }

    pub fn label(&self) -> String {
        payment_label(self.payment_type, self.installment_number, self.category_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum PaymentStatus {
    Pending,
    PartiallyPaid,
    Overdue,
    PartiallyPaidOverdue,
    Paid,
    Cancelled,
}

/// Append-only record of one receipt against a payment. Rows are never
/// updated or deleted; administrative corrections add reconciling rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub amount_cents: i64,
    pub currency: Currency,
    pub paid_on: NaiveDate,
    pub method: Option<PaymentMethod>,
    pub recorded_by: Uuid,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentTemplateRequest {
    pub payment_type: PaymentType,
    pub installment_number: Option<i32>,
    #[serde(default)]
    pub is_first_installment: bool,
    #[serde(default)]
    pub includes_season_pass: bool,
    pub category_name: Option<String>,
    pub birth_year_from: Option<i32>,
    pub birth_year_to: Option<i32>,
    pub amount_cents: i64,
    pub currency: Currency,
    pub due_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
}
