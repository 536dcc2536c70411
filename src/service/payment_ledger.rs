use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    auth::Actor,
    domain::{
        Currency, Payment, PaymentMethod, PaymentStatus, PaymentTransaction,
    },
    error::{AppError, Result},
    notifications::{Mailer, PaymentConfirmedEmail},
    repository::{
        GuardianRepository, LedgerUpdate, ParticipantRepository, PaymentRepository,
        RegistrationRepository, TripRepository,
    },
};

/// Note attached to synthesized transactions so they are distinguishable
/// from receipts entered by hand.
const SYSTEM_SETTLEMENT_NOTE: &str = "Remaining balance settled when marking as paid";
const SYSTEM_CORRECTION_NOTE: &str = "Administrative status correction";

pub struct RecordTransactionRequest {
    pub amount_cents: i64,
    pub currency: Currency,
    pub paid_on: NaiveDate,
    pub method: Option<PaymentMethod>,
    pub note: Option<String>,
}

/// Tracks amount owed against amount received per payment and derives the
/// payment status from it. Every mutation goes through here; the repository
/// only persists what the ledger decided.
pub struct PaymentLedger {
    payment_repo: Arc<dyn PaymentRepository>,
    registration_repo: Arc<dyn RegistrationRepository>,
    participant_repo: Arc<dyn ParticipantRepository>,
    guardian_repo: Arc<dyn GuardianRepository>,
    trip_repo: Arc<dyn TripRepository>,
    mailer: Arc<dyn Mailer>,
}

impl PaymentLedger {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        registration_repo: Arc<dyn RegistrationRepository>,
        participant_repo: Arc<dyn ParticipantRepository>,
        guardian_repo: Arc<dyn GuardianRepository>,
        trip_repo: Arc<dyn TripRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            payment_repo,
            registration_repo,
            participant_repo,
            guardian_repo,
            trip_repo,
            mailer,
        }
    }

    pub async fn record_transaction(
        &self,
        actor: &Actor,
        payment_id: Uuid,
        request: RecordTransactionRequest,
    ) -> Result<Payment> {
        if request.amount_cents <= 0 {
            return Err(AppError::Validation(
                "Transaction amount must be positive".to_string(),
            ));
        }

        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        if request.currency != payment.currency {
            // Accepted as-is; see DESIGN.md on mismatched-currency receipts.
            tracing::warn!(
                payment_id = %payment_id,
                payment_currency = %payment.currency,
                transaction_currency = %request.currency,
                "Transaction currency differs from payment currency"
            );
        }

        self.payment_repo
            .insert_transaction(PaymentTransaction {
                id: Uuid::new_v4(),
                payment_id,
                amount_cents: request.amount_cents,
                currency: request.currency,
                paid_on: request.paid_on,
                method: request.method,
                recorded_by: actor.id,
                note: request.note,
                created_at: Utc::now(),
            })
            .await?;

        let now = Utc::now();
        let new_amount_paid = payment.amount_paid_cents + request.amount_cents;
        let new_status = derive_status_after_receipt(
            payment.status,
            payment.amount_cents,
            new_amount_paid,
            payment.due_date,
            now.date_naive(),
        );
        let paid_at = if new_status == PaymentStatus::Paid {
            payment.paid_at.or(Some(now))
        } else {
            payment.paid_at
        };

        let updated = self
            .payment_repo
            .apply_ledger_update(
                payment_id,
                LedgerUpdate {
                    amount_paid_cents: new_amount_paid,
                    status: new_status,
                    paid_at,
                },
            )
            .await?;

        if payment.status != PaymentStatus::Paid && updated.status == PaymentStatus::Paid {
            self.dispatch_payment_confirmed(&updated).await;
        }

        Ok(updated)
    }

    /// Settles whatever is still owed with one synthesized transaction and
    /// forces the payment into Paid.
    pub async fn mark_fully_paid(
        &self,
        actor: &Actor,
        payment_id: Uuid,
        method: Option<PaymentMethod>,
    ) -> Result<Payment> {
        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        let now = Utc::now();
        let remaining = payment.remaining_cents();
        if remaining > 0 {
            self.payment_repo
                .insert_transaction(PaymentTransaction {
                    id: Uuid::new_v4(),
                    payment_id,
                    amount_cents: remaining,
                    currency: payment.currency,
                    paid_on: now.date_naive(),
                    method,
                    recorded_by: actor.id,
                    note: Some(SYSTEM_SETTLEMENT_NOTE.to_string()),
                    created_at: now,
                })
                .await?;
        }

        let updated = self
            .payment_repo
            .apply_ledger_update(
                payment_id,
                LedgerUpdate {
                    amount_paid_cents: payment.amount_cents,
                    status: PaymentStatus::Paid,
                    paid_at: Some(now),
                },
            )
            .await?;

        if payment.status != PaymentStatus::Paid {
            self.dispatch_payment_confirmed(&updated).await;
        }

        Ok(updated)
    }

    /// Administrative override. Only Pending, Paid and Cancelled can be set
    /// directly; partial states always come from recorded receipts. The
    /// override writes a reconciling transaction for the amount_paid delta so
    /// the transaction history still sums to the ledger total.
    pub async fn set_status(
        &self,
        actor: &Actor,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment> {
        if !matches!(
            status,
            PaymentStatus::Pending | PaymentStatus::Paid | PaymentStatus::Cancelled
        ) {
            return Err(AppError::Validation(
                "Status can only be set to pending, paid or cancelled".to_string(),
            ));
        }

        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        let now = Utc::now();
        let (new_amount_paid, paid_at) = match status {
            PaymentStatus::Paid => (payment.amount_cents, Some(now)),
            PaymentStatus::Pending => (0, None),
            _ => (payment.amount_paid_cents, payment.paid_at),
        };

        let delta = new_amount_paid - payment.amount_paid_cents;
        if delta != 0 {
            self.payment_repo
                .insert_transaction(PaymentTransaction {
                    id: Uuid::new_v4(),
                    payment_id,
                    amount_cents: delta,
                    currency: payment.currency,
                    paid_on: now.date_naive(),
                    method: None,
                    recorded_by: actor.id,
                    note: Some(SYSTEM_CORRECTION_NOTE.to_string()),
                    created_at: now,
                })
                .await?;
        }

        let updated = self
            .payment_repo
            .apply_ledger_update(
                payment_id,
                LedgerUpdate {
                    amount_paid_cents: new_amount_paid,
                    status,
                    paid_at,
                },
            )
            .await?;

        if payment.status != PaymentStatus::Paid && updated.status == PaymentStatus::Paid {
            self.dispatch_payment_confirmed(&updated).await;
        }

        Ok(updated)
    }

    /// Recomputes the owed amount from the immutable baseline. Already
    /// recorded receipts and the derived status are left alone; see DESIGN.md
    /// for the late-discount-on-paid decision.
    pub async fn apply_discount(&self, payment_id: Uuid, percentage: f64) -> Result<Payment> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(AppError::Validation(
                "Discount must be between 0 and 100 percent".to_string(),
            ));
        }

        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        let amount = discounted_amount_cents(payment.original_amount_cents, percentage);
        self.payment_repo
            .update_amount_and_discount(payment_id, amount, percentage)
            .await
    }

    /// Manual correction that bypasses the original-amount/discount
    /// relationship entirely. No status re-derivation.
    pub async fn update_amount(&self, payment_id: Uuid, amount_cents: i64) -> Result<Payment> {
        if amount_cents < 0 {
            return Err(AppError::Validation(
                "Amount must not be negative".to_string(),
            ));
        }

        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        self.payment_repo
            .update_amount_and_discount(payment_id, amount_cents, payment.discount_percentage)
            .await
    }

    pub async fn list_payments(&self, registration_id: Uuid) -> Result<Vec<Payment>> {
        self.payment_repo.list_by_registration(registration_id).await
    }

    pub async fn list_transactions(&self, payment_id: Uuid) -> Result<Vec<PaymentTransaction>> {
        self.payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        self.payment_repo.list_transactions(payment_id).await
    }

    /// Fire-and-forget: lookup failures and SMTP failures are logged, never
    /// propagated into the ledger mutation that triggered the mail.
    async fn dispatch_payment_confirmed(&self, payment: &Payment) {
        let context = self.load_mail_context(payment).await;
        let email = match context {
            Ok(email) => email,
            Err(e) => {
                tracing::error!(
                    payment_id = %payment.id,
                    "Could not assemble payment confirmation mail: {}",
                    e
                );
                return;
            }
        };

        let mailer = self.mailer.clone();
        let payment_id = payment.id;
        tokio::spawn(async move {
            if let Err(e) = mailer.send_payment_confirmed(email).await {
                tracing::error!(
                    payment_id = %payment_id,
                    "Failed to send payment confirmation: {}",
                    e
                );
            }
        });
    }

    async fn load_mail_context(&self, payment: &Payment) -> Result<PaymentConfirmedEmail> {
        let registration = self
            .registration_repo
            .find_by_id(payment.registration_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;
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
        let trip = self
            .trip_repo
            .find_by_id(registration.trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        Ok(PaymentConfirmedEmail {
            guardian_email: guardian.email,
            guardian_first_name: guardian.first_name,
            participant_name: participant.full_name(),
            trip_title: trip.title,
            amount_cents: payment.amount_cents,
            currency: payment.currency.to_string(),
            payment_label: payment.label(),
        })
    }
}

/// Amount owed after a percentage discount, rounded to the nearest cent.
pub(crate) fn discounted_amount_cents(original_cents: i64, percentage: f64) -> i64 {
    (original_cents as f64 * (1.0 - percentage / 100.0)).round() as i64
}

/// Status after a receipt lands. A payment that is neither fully nor
/// partially covered keeps whatever pending/overdue state it already had.
pub(crate) fn derive_status_after_receipt(
    current: PaymentStatus,
    amount_cents: i64,
    amount_paid_cents: i64,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> PaymentStatus {
    if amount_paid_cents >= amount_cents {
        PaymentStatus::Paid
    } else if amount_paid_cents > 0 {
        if due_date.map_or(false, |due| due < today) {
            PaymentStatus::PartiallyPaidOverdue
        } else {
            PaymentStatus::PartiallyPaid
        }
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn discount_rounds_to_cents() {
        assert_eq!(discounted_amount_cents(50_000, 20.0), 40_000);
        assert_eq!(discounted_amount_cents(50_000, 0.0), 50_000);
        assert_eq!(discounted_amount_cents(50_000, 100.0), 0);
        assert_eq!(discounted_amount_cents(9_999, 33.33), 6_666);
    }

    #[test]
    fn full_receipt_is_paid() {
        let status = derive_status_after_receipt(
            PaymentStatus::Pending,
            50_000,
            50_000,
            Some(date(2025, 3, 1)),
            date(2025, 2, 1),
        );
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn overpayment_is_still_paid() {
        let status = derive_status_after_receipt(
            PaymentStatus::PartiallyPaid,
            50_000,
            60_000,
            None,
            date(2025, 2, 1),
        );
        assert_eq!(status, PaymentStatus::Paid);
    }

    #[test]
    fn partial_receipt_before_due_date() {
        let status = derive_status_after_receipt(
            PaymentStatus::Pending,
            50_000,
            30_000,
            Some(date(2025, 3, 1)),
            date(2025, 2, 1),
        );
        assert_eq!(status, PaymentStatus::PartiallyPaid);
    }

    #[test]
    fn partial_receipt_after_due_date() {
        let status = derive_status_after_receipt(
            PaymentStatus::Pending,
            50_000,
            30_000,
            Some(date(2025, 3, 1)),
            date(2025, 3, 2),
        );
        assert_eq!(status, PaymentStatus::PartiallyPaidOverdue);
    }

    #[test]
    fn zero_paid_keeps_current_state() {
        let status = derive_status_after_receipt(
            PaymentStatus::Overdue,
            50_000,
            0,
            Some(date(2025, 3, 1)),
            date(2025, 4, 1),
        );
        assert_eq!(status, PaymentStatus::Overdue);
    }
}
