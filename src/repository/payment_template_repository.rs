use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        CreatePaymentTemplateRequest, Currency, PaymentMethod, PaymentTemplate, PaymentType,
    },
    error::{AppError, Result},
    repository::PaymentTemplateRepository,
};

#[derive(FromRow)]
struct PaymentTemplateRow {
    id: String,
    trip_id: String,
    payment_type: String,
    installment_number: Option<i32>,
    is_first_installment: bool,
    includes_season_pass: bool,
    category_name: Option<String>,
    birth_year_from: Option<i32>,
    birth_year_to: Option<i32>,
    amount_cents: i64,
    currency: String,
    due_date: Option<NaiveDate>,
    payment_method: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePaymentTemplateRepository {
    pool: SqlitePool,
}

impl SqlitePaymentTemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_template(row: PaymentTemplateRow) -> Result<PaymentTemplate> {
        Ok(PaymentTemplate {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            trip_id: Uuid::parse_str(&row.trip_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            payment_type: parse_payment_type(&row.payment_type)?,
            installment_number: row.installment_number,
            is_first_installment: row.is_first_installment,
            includes_season_pass: row.includes_season_pass,
            category_name: row.category_name,
            birth_year_from: row.birth_year_from,
            birth_year_to: row.birth_year_to,
            amount_cents: row.amount_cents,
            currency: parse_currency(&row.currency)?,
            due_date: row.due_date,
            payment_method: row.payment_method.as_deref().map(parse_payment_method).transpose()?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

pub(crate) fn parse_payment_type(s: &str) -> Result<PaymentType> {
    match s {
        "Installment" => Ok(PaymentType::Installment),
        "SeasonPass" => Ok(PaymentType::SeasonPass),
        "Full" => Ok(PaymentType::Full),
        _ => Err(AppError::Database(format!("Invalid payment type: {}", s))),
    }
}

pub(crate) fn payment_type_to_str(payment_type: &PaymentType) -> &'static str {
    match payment_type {
        PaymentType::Installment => "Installment",
        PaymentType::SeasonPass => "SeasonPass",
        PaymentType::Full => "Full",
    }
}

pub(crate) fn parse_currency(s: &str) -> Result<Currency> {
    match s {
        "PLN" => Ok(Currency::PLN),
        "EUR" => Ok(Currency::EUR),
        _ => Err(AppError::Database(format!("Invalid currency: {}", s))),
    }
}

pub(crate) fn currency_to_str(currency: &Currency) -> &'static str {
    match currency {
        Currency::PLN => "PLN",
        Currency::EUR => "EUR",
    }
}

pub(crate) fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
    match s {
        "Cash" => Ok(PaymentMethod::Cash),
        "Transfer" => Ok(PaymentMethod::Transfer),
        "Both" => Ok(PaymentMethod::Both),
        _ => Err(AppError::Database(format!("Invalid payment method: {}", s))),
    }
}

pub(crate) fn payment_method_to_str(method: &PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::Transfer => "Transfer",
        PaymentMethod::Both => "Both",
    }
}

#[async_trait]
impl PaymentTemplateRepository for SqlitePaymentTemplateRepository {
    async fn create(
        &self,
        trip_id: Uuid,
        template: CreatePaymentTemplateRequest,
    ) -> Result<PaymentTemplate> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payment_templates (
                id, trip_id, payment_type, installment_number,
                is_first_installment, includes_season_pass, category_name,
                birth_year_from, birth_year_to, amount_cents, currency,
                due_date, payment_method, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(trip_id.to_string())
        .bind(payment_type_to_str(&template.payment_type))
        .bind(template.installment_number)
        .bind(template.is_first_installment)
        .bind(template.includes_season_pass)
        .bind(&template.category_name)
        .bind(template.birth_year_from)
        .bind(template.birth_year_to)
        .bind(template.amount_cents)
        .bind(currency_to_str(&template.currency))
        .bind(template.due_date)
        .bind(template.payment_method.as_ref().map(payment_method_to_str))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created payment template".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PaymentTemplate>> {
        let row = sqlx::query_as::<_, PaymentTemplateRow>(
            r#"
            SELECT id, trip_id, payment_type, installment_number,
                   is_first_installment, includes_season_pass, category_name,
                   birth_year_from, birth_year_to, amount_cents, currency,
                   due_date, payment_method, created_at, updated_at
            FROM payment_templates
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_template(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_trip(&self, trip_id: Uuid) -> Result<Vec<PaymentTemplate>> {
        let rows = sqlx::query_as::<_, PaymentTemplateRow>(
            r#"
            SELECT id, trip_id, payment_type, installment_number,
                   is_first_installment, includes_season_pass, category_name,
                   birth_year_from, birth_year_to, amount_cents, currency,
                   due_date, payment_method, created_at, updated_at
            FROM payment_templates
            WHERE trip_id = ?
            ORDER BY installment_number, created_at
            "#,
        )
        .bind(trip_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_template).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // Existing payments keep their copied fields; only the template
        // reference is detached.
        sqlx::query("UPDATE payments SET template_id = NULL WHERE template_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM payment_templates WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
