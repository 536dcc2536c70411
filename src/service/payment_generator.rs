use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{Participant, Payment, PaymentStatus, Registration},
    error::Result,
    repository::{PaymentRepository, PaymentTemplateRepository},
};

/// Instantiates a trip's payment templates into concrete obligations for one
/// registration. Callers guard with "no live payment exists yet"; the unique
/// key on (registration_id, template_id) closes the remaining race.
pub struct PaymentGenerator {
    template_repo: Arc<dyn PaymentTemplateRepository>,
    payment_repo: Arc<dyn PaymentRepository>,
}

impl PaymentGenerator {
    pub fn new(
        template_repo: Arc<dyn PaymentTemplateRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            template_repo,
            payment_repo,
        }
    }

    /// Returns the number of payments created. A trip without templates is a
    /// no-op, not an error.
    pub async fn generate_for_registration(
        &self,
        registration: &Registration,
        participant: &Participant,
    ) -> Result<usize> {
        let templates = self.template_repo.list_by_trip(registration.trip_id).await?;
        if templates.is_empty() {
            return Ok(0);
        }

        let birth_year = participant.birth_year();
        let now = Utc::now();

        let payments: Vec<Payment> = templates
            .into_iter()
            .filter(|tpl| tpl.eligible_for_birth_year(birth_year))
            .map(|tpl| Payment {
                id: Uuid::new_v4(),
                registration_id: registration.id,
                template_id: Some(tpl.id),
                payment_type: tpl.payment_type,
                installment_number: tpl.installment_number,
                category_name: tpl.category_name.clone(),
                original_amount_cents: tpl.amount_cents,
                amount_cents: tpl.amount_cents,
                currency: tpl.currency,
                due_date: tpl.due_date,
                status: PaymentStatus::Pending,
                amount_paid_cents: 0,
                discount_percentage: 0.0,
                paid_at: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        if payments.is_empty() {
            return Ok(0);
        }

        let count = payments.len();
        let inserted = self.payment_repo.create_batch(payments).await?;
        if !inserted {
            tracing::debug!(
                registration_id = %registration.id,
                "Payments already generated by a concurrent confirmation, skipping"
            );
            return Ok(0);
        }

        tracing::info!(
            registration_id = %registration.id,
            count,
            "Generated payments from trip templates"
        );
        Ok(count)
    }
}
