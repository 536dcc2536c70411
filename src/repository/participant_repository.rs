use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateGuardianRequest, CreateParticipantRequest, Guardian, Participant},
    error::{AppError, Result},
    repository::{GuardianRepository, ParticipantRepository},
};

#[derive(FromRow)]
struct ParticipantRow {
    id: String,
    guardian_id: String,
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
    group_name: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteParticipantRepository {
    pool: SqlitePool,
}

impl SqliteParticipantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_participant(row: ParticipantRow) -> Result<Participant> {
        Ok(Participant {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            guardian_id: Uuid::parse_str(&row.guardian_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            first_name: row.first_name,
            last_name: row.last_name,
            birth_date: row.birth_date,
            group_name: row.group_name,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl ParticipantRepository for SqliteParticipantRepository {
    async fn create(&self, participant: CreateParticipantRequest) -> Result<Participant> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO participants (
                id, guardian_id, first_name, last_name, birth_date, group_name,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(participant.guardian_id.to_string())
        .bind(&participant.first_name)
        .bind(&participant.last_name)
        .bind(participant.birth_date)
        .bind(&participant.group_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created participant".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, guardian_id, first_name, last_name, birth_date, group_name,
                   created_at, updated_at
            FROM participants
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_participant(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_guardian(&self, guardian_id: Uuid) -> Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT id, guardian_id, first_name, last_name, birth_date, group_name,
                   created_at, updated_at
            FROM participants
            WHERE guardian_id = ?
            ORDER BY last_name, first_name
            "#,
        )
        .bind(guardian_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_participant).collect()
    }
}

#[derive(FromRow)]
struct GuardianRow {
    id: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    address: Option<String>,
    pesel: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteGuardianRepository {
    pool: SqlitePool,
}

impl SqliteGuardianRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_guardian(row: GuardianRow) -> Result<Guardian> {
        Ok(Guardian {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            address: row.address,
            pesel: row.pesel,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl GuardianRepository for SqliteGuardianRepository {
    async fn create(&self, guardian: CreateGuardianRequest) -> Result<Guardian> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO guardians (
                id, email, first_name, last_name, phone, address, pesel,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&guardian.email)
        .bind(&guardian.first_name)
        .bind(&guardian.last_name)
        .bind(&guardian.phone)
        .bind(&guardian.address)
        .bind(&guardian.pesel)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created guardian".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Guardian>> {
        let row = sqlx::query_as::<_, GuardianRow>(
            r#"
            SELECT id, email, first_name, last_name, phone, address, pesel,
                   created_at, updated_at
            FROM guardians
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_guardian(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Guardian>> {
        let row = sqlx::query_as::<_, GuardianRow>(
            r#"
            SELECT id, email, first_name, last_name, phone, address, pesel,
                   created_at, updated_at
            FROM guardians
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_guardian(r)?)),
            None => Ok(None),
        }
    }
}
