use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Contract, ContractTemplate, UpsertContractTemplateRequest},
    error::{AppError, Result},
    repository::{ContractRepository, ContractTemplateRepository},
};

#[derive(FromRow)]
struct ContractRow {
    id: String,
    trip_id: String,
    participant_id: String,
    registration_id: String,
    contract_number: String,
    body: String,
    issued_by: String,
    accepted_at: Option<NaiveDateTime>,
    accepted_by: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteContractRepository {
    pool: SqlitePool,
}

impl SqliteContractRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_contract(row: ContractRow) -> Result<Contract> {
        Ok(Contract {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            trip_id: Uuid::parse_str(&row.trip_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            participant_id: Uuid::parse_str(&row.participant_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            registration_id: Uuid::parse_str(&row.registration_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            contract_number: row.contract_number,
            body: row.body,
            issued_by: Uuid::parse_str(&row.issued_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            accepted_at: row
                .accepted_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            accepted_by: row
                .accepted_by
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(|e| AppError::Database(e.to_string()))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl ContractRepository for SqliteContractRepository {
    async fn create(&self, contract: Contract) -> Result<Contract> {
        sqlx::query(
            r#"
            INSERT INTO contracts (
                id, trip_id, participant_id, registration_id, contract_number,
                body, issued_by, accepted_at, accepted_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(contract.id.to_string())
        .bind(contract.trip_id.to_string())
        .bind(contract.participant_id.to_string())
        .bind(contract.registration_id.to_string())
        .bind(&contract.contract_number)
        .bind(&contract.body)
        .bind(contract.issued_by.to_string())
        .bind(contract.accepted_at.map(|dt| dt.naive_utc()))
        .bind(contract.accepted_by.map(|id| id.to_string()))
        .bind(contract.created_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(contract)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>(
            r#"
            SELECT id, trip_id, participant_id, registration_id,
                   contract_number, body, issued_by, accepted_at, accepted_by,
                   created_at
            FROM contracts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_contract(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_trip_and_participant(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>(
            r#"
            SELECT id, trip_id, participant_id, registration_id,
                   contract_number, body, issued_by, accepted_at, accepted_by,
                   created_at
            FROM contracts
            WHERE trip_id = ? AND participant_id = ?
            "#,
        )
        .bind(trip_id.to_string())
        .bind(participant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_contract(r)?)),
            None => Ok(None),
        }
    }

    async fn exists_for_trip_and_participant(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contracts WHERE trip_id = ? AND participant_id = ?",
        )
        .bind(trip_id.to_string())
        .bind(participant_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    async fn next_contract_number(&self, year: i32) -> Result<i64> {
        // Single-statement increment-and-read keeps numbering race-free
        // without counting existing contract rows.
        let number: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO contract_counters (year, last_number)
            VALUES (?, 1)
            ON CONFLICT (year) DO UPDATE SET last_number = last_number + 1
            RETURNING last_number
            "#,
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(number)
    }

    async fn mark_accepted(&self, id: Uuid, accepted_by: Uuid) -> Result<Contract> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE contracts
            SET accepted_at = ?, accepted_by = ?
            WHERE id = ? AND accepted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(accepted_by.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contract not found".to_string()))
    }
}

#[derive(FromRow)]
struct ContractTemplateRow {
    id: String,
    trip_id: String,
    body: String,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteContractTemplateRepository {
    pool: SqlitePool,
}

impl SqliteContractTemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_template(row: ContractTemplateRow) -> Result<ContractTemplate> {
        Ok(ContractTemplate {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            trip_id: Uuid::parse_str(&row.trip_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            body: row.body,
            is_active: row.is_active,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl ContractTemplateRepository for SqliteContractTemplateRepository {
    async fn upsert(
        &self,
        trip_id: Uuid,
        template: UpsertContractTemplateRequest,
    ) -> Result<ContractTemplate> {
        let now = Utc::now().naive_utc();
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO contract_templates (
                id, trip_id, body, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (trip_id) DO UPDATE SET
                body = excluded.body,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id.to_string())
        .bind(trip_id.to_string())
        .bind(&template.body)
        .bind(template.is_active)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_trip(trip_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve upserted contract template".to_string())
        })
    }

    async fn find_by_trip(&self, trip_id: Uuid) -> Result<Option<ContractTemplate>> {
        let row = sqlx::query_as::<_, ContractTemplateRow>(
            r#"
            SELECT id, trip_id, body, is_active, created_at, updated_at
            FROM contract_templates
            WHERE trip_id = ?
            "#,
        )
        .bind(trip_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_template(r)?)),
            None => Ok(None),
        }
    }
}
