use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{BankAccount, CreateTripRequest, Trip, TripStatus, UpdateTripRequest},
    error::{AppError, Result},
    repository::TripRepository,
};

#[derive(FromRow)]
struct TripRow {
    id: String,
    title: String,
    location: String,
    status: String,
    departure_at: NaiveDateTime,
    return_at: NaiveDateTime,
    primary_stop: String,
    secondary_stop: Option<String>,
    eligible_groups: String,
    bank_accounts: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteTripRepository {
    pool: SqlitePool,
}

impl SqliteTripRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_trip(row: TripRow) -> Result<Trip> {
        let eligible_groups: Vec<String> = serde_json::from_str(&row.eligible_groups)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let bank_accounts: Vec<BankAccount> = serde_json::from_str(&row.bank_accounts)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Trip {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            location: row.location,
            status: Self::parse_trip_status(&row.status)?,
            departure_at: DateTime::from_naive_utc_and_offset(row.departure_at, Utc),
            return_at: DateTime::from_naive_utc_and_offset(row.return_at, Utc),
            primary_stop: row.primary_stop,
            secondary_stop: row.secondary_stop,
            eligible_groups,
            bank_accounts,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_trip_status(s: &str) -> Result<TripStatus> {
        match s {
            "Draft" => Ok(TripStatus::Draft),
            "Published" => Ok(TripStatus::Published),
            "Cancelled" => Ok(TripStatus::Cancelled),
            "Completed" => Ok(TripStatus::Completed),
            _ => Err(AppError::Database(format!("Invalid trip status: {}", s))),
        }
    }

    fn trip_status_to_str(status: &TripStatus) -> &'static str {
        match status {
            TripStatus::Draft => "Draft",
            TripStatus::Published => "Published",
            TripStatus::Cancelled => "Cancelled",
            TripStatus::Completed => "Completed",
        }
    }
}

#[async_trait]
impl TripRepository for SqliteTripRepository {
    async fn create(&self, trip: CreateTripRequest) -> Result<Trip> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let eligible_groups = serde_json::to_string(&trip.eligible_groups)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let bank_accounts = serde_json::to_string(&trip.bank_accounts)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO trips (
                id, title, location, status, departure_at, return_at,
                primary_stop, secondary_stop, eligible_groups, bank_accounts,
                created_at, updated_at
            ) VALUES (?, ?, ?, 'Draft', ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&trip.title)
        .bind(&trip.location)
        .bind(trip.departure_at.naive_utc())
        .bind(trip.return_at.naive_utc())
        .bind(&trip.primary_stop)
        .bind(&trip.secondary_stop)
        .bind(&eligible_groups)
        .bind(&bank_accounts)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created trip".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, title, location, status, departure_at, return_at,
                   primary_stop, secondary_stop, eligible_groups, bank_accounts,
                   created_at, updated_at
            FROM trips
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_trip(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, title, location, status, departure_at, return_at,
                   primary_stop, secondary_stop, eligible_groups, bank_accounts,
                   created_at, updated_at
            FROM trips
            ORDER BY departure_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_trip).collect()
    }

    async fn list_active(&self) -> Result<Vec<Trip>> {
        // "Now" is resolved per call, never cached in process state.
        let now = Utc::now().naive_utc();
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, title, location, status, departure_at, return_at,
                   primary_stop, secondary_stop, eligible_groups, bank_accounts,
                   created_at, updated_at
            FROM trips
            WHERE return_at >= ?
            ORDER BY departure_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_trip).collect()
    }

    async fn list_completed(&self) -> Result<Vec<Trip>> {
        let now = Utc::now().naive_utc();
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, title, location, status, departure_at, return_at,
                   primary_stop, secondary_stop, eligible_groups, bank_accounts,
                   created_at, updated_at
            FROM trips
            WHERE return_at < ?
            ORDER BY departure_at DESC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_trip).collect()
    }

    async fn update(&self, id: Uuid, update: UpdateTripRequest) -> Result<Trip> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

        let title = update.title.unwrap_or(current.title);
        let location = update.location.unwrap_or(current.location);
        let status = update.status.unwrap_or(current.status);
        let departure_at = update.departure_at.unwrap_or(current.departure_at);
        let return_at = update.return_at.unwrap_or(current.return_at);
        let primary_stop = update.primary_stop.unwrap_or(current.primary_stop);
        let secondary_stop = update.secondary_stop.unwrap_or(current.secondary_stop);
        let eligible_groups = update.eligible_groups.unwrap_or(current.eligible_groups);
        let bank_accounts = update.bank_accounts.unwrap_or(current.bank_accounts);

        let eligible_groups_json = serde_json::to_string(&eligible_groups)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let bank_accounts_json = serde_json::to_string(&bank_accounts)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            UPDATE trips
            SET title = ?,
                location = ?,
                status = ?,
                departure_at = ?,
                return_at = ?,
                primary_stop = ?,
                secondary_stop = ?,
                eligible_groups = ?,
                bank_accounts = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&title)
        .bind(&location)
        .bind(Self::trip_status_to_str(&status))
        .bind(departure_at.naive_utc())
        .bind(return_at.naive_utc())
        .bind(&primary_stop)
        .bind(&secondary_stop)
        .bind(&eligible_groups_json)
        .bind(&bank_accounts_json)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated trip".to_string()))
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM contracts WHERE trip_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            DELETE FROM payment_transactions
            WHERE payment_id IN (
                SELECT p.id FROM payments p
                JOIN registrations r ON r.id = p.registration_id
                WHERE r.trip_id = ?
            )
            "#,
        )
        .bind(&id_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            DELETE FROM payments
            WHERE registration_id IN (
                SELECT id FROM registrations WHERE trip_id = ?
            )
            "#,
        )
        .bind(&id_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM registrations WHERE trip_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM payment_templates WHERE trip_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM contract_templates WHERE trip_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
