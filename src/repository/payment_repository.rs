use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Payment, PaymentStatus, PaymentTransaction},
    error::{AppError, Result},
    repository::{
        payment_template_repository::{
            currency_to_str, parse_currency, parse_payment_method, parse_payment_type,
            payment_method_to_str, payment_type_to_str,
        },
        LedgerUpdate, PaymentRepository,
    },
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    registration_id: String,
    template_id: Option<String>,
    payment_type: String,
    installment_number: Option<i32>,
    category_name: Option<String>,
    original_amount_cents: i64,
    amount_cents: i64,
    currency: String,
    due_date: Option<NaiveDate>,
    status: String,
    amount_paid_cents: i64,
    discount_percentage: f64,
    paid_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PaymentTransactionRow {
    id: String,
    payment_id: String,
    amount_cents: i64,
    currency: String,
    paid_on: NaiveDate,
    method: Option<String>,
    recorded_by: String,
    note: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            registration_id: Uuid::parse_str(&row.registration_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            template_id: row
                .template_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(|e| AppError::Database(e.to_string()))?,
            payment_type: parse_payment_type(&row.payment_type)?,
            installment_number: row.installment_number,
            category_name: row.category_name,
            original_amount_cents: row.original_amount_cents,
            amount_cents: row.amount_cents,
            currency: parse_currency(&row.currency)?,
            due_date: row.due_date,
            status: parse_payment_status(&row.status)?,
            amount_paid_cents: row.amount_paid_cents,
            discount_percentage: row.discount_percentage,
            paid_at: row.paid_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_transaction(row: PaymentTransactionRow) -> Result<PaymentTransaction> {
        Ok(PaymentTransaction {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            payment_id: Uuid::parse_str(&row.payment_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            amount_cents: row.amount_cents,
            currency: parse_currency(&row.currency)?,
            paid_on: row.paid_on,
            method: row.method.as_deref().map(parse_payment_method).transpose()?,
            recorded_by: Uuid::parse_str(&row.recorded_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            note: row.note,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

pub(crate) fn parse_payment_status(s: &str) -> Result<PaymentStatus> {
    match s {
        "Pending" => Ok(PaymentStatus::Pending),
        "PartiallyPaid" => Ok(PaymentStatus::PartiallyPaid),
        "Overdue" => Ok(PaymentStatus::Overdue),
        "PartiallyPaidOverdue" => Ok(PaymentStatus::PartiallyPaidOverdue),
        "Paid" => Ok(PaymentStatus::Paid),
        "Cancelled" => Ok(PaymentStatus::Cancelled),
        _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
    }
}

pub(crate) fn payment_status_to_str(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "Pending",
        PaymentStatus::PartiallyPaid => "PartiallyPaid",
        PaymentStatus::Overdue => "Overdue",
        PaymentStatus::PartiallyPaidOverdue => "PartiallyPaidOverdue",
        PaymentStatus::Paid => "Paid",
        PaymentStatus::Cancelled => "Cancelled",
    }
}

const PAYMENT_COLUMNS: &str = r#"
    id, registration_id, template_id, payment_type, installment_number,
    category_name, original_amount_cents, amount_cents, currency, due_date,
    status, amount_paid_cents, discount_percentage, paid_at, created_at,
    updated_at
"#;

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create_batch(&self, payments: Vec<Payment>) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for payment in &payments {
            let result = sqlx::query(
                r#"
                INSERT INTO payments (
                    id, registration_id, template_id, payment_type,
                    installment_number, category_name, original_amount_cents,
                    amount_cents, currency, due_date, status,
                    amount_paid_cents, discount_percentage, paid_at,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(payment.id.to_string())
            .bind(payment.registration_id.to_string())
            .bind(payment.template_id.map(|id| id.to_string()))
            .bind(payment_type_to_str(&payment.payment_type))
            .bind(payment.installment_number)
            .bind(&payment.category_name)
            .bind(payment.original_amount_cents)
            .bind(payment.amount_cents)
            .bind(currency_to_str(&payment.currency))
            .bind(payment.due_date)
            .bind(payment_status_to_str(&payment.status))
            .bind(payment.amount_paid_cents)
            .bind(payment.discount_percentage)
            .bind(payment.paid_at.map(|dt| dt.naive_utc()))
            .bind(payment.created_at.naive_utc())
            .bind(payment.updated_at.naive_utc())
            .execute(&mut *tx)
            .await;

            match result {
                Ok(_) => {}
                // A (registration_id, template_id) conflict means another
                // caller already generated this batch; roll everything back
                // and report that generation was skipped.
                Err(e) if e
                    .as_database_error()
                    .map_or(false, |d| d.is_unique_violation()) =>
                {
                    tx.rollback()
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                    return Ok(false);
                }
                Err(e) => return Err(AppError::Database(e.to_string())),
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_registration(&self, registration_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE registration_id = ? ORDER BY created_at",
            PAYMENT_COLUMNS
        ))
        .bind(registration_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn count_live_by_registration(&self, registration_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM payments
            WHERE registration_id = ? AND status != 'Cancelled'
            "#,
        )
        .bind(registration_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }

    async fn cancel_pending_by_registration(&self, registration_id: Uuid) -> Result<u64> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'Cancelled', updated_at = ?
            WHERE registration_id = ? AND status = 'Pending'
            "#,
        )
        .bind(now)
        .bind(registration_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn apply_ledger_update(&self, id: Uuid, update: LedgerUpdate) -> Result<Payment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE payments
            SET amount_paid_cents = ?,
                status = ?,
                paid_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.amount_paid_cents)
        .bind(payment_status_to_str(&update.status))
        .bind(update.paid_at.map(|dt| dt.naive_utc()))
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated payment".to_string()))
    }

    async fn update_amount_and_discount(
        &self,
        id: Uuid,
        amount_cents: i64,
        discount_percentage: f64,
    ) -> Result<Payment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE payments
            SET amount_cents = ?,
                discount_percentage = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(amount_cents)
        .bind(discount_percentage)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated payment".to_string()))
    }

    async fn insert_transaction(&self, tx: PaymentTransaction) -> Result<PaymentTransaction> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, payment_id, amount_cents, currency, paid_on, method,
                recorded_by, note, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.id.to_string())
        .bind(tx.payment_id.to_string())
        .bind(tx.amount_cents)
        .bind(currency_to_str(&tx.currency))
        .bind(tx.paid_on)
        .bind(tx.method.as_ref().map(payment_method_to_str))
        .bind(tx.recorded_by.to_string())
        .bind(&tx.note)
        .bind(tx.created_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(tx)
    }

    async fn list_transactions(&self, payment_id: Uuid) -> Result<Vec<PaymentTransaction>> {
        let rows = sqlx::query_as::<_, PaymentTransactionRow>(
            r#"
            SELECT id, payment_id, amount_cents, currency, paid_on, method,
                   recorded_by, note, created_at
            FROM payment_transactions
            WHERE payment_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(payment_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_transaction).collect()
    }
}
