use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{DepartureStop, ParticipationStatus, Registration, RegistrationStatus},
    error::{AppError, Result},
    repository::{RegistrationRepository, UpsertRegistration},
};

#[derive(FromRow)]
struct RegistrationRow {
    id: String,
    trip_id: String,
    participant_id: String,
    status: String,
    participation_status: String,
    departure_stop: Option<String>,
    participation_note: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteRegistrationRepository {
    pool: SqlitePool,
}

impl SqliteRegistrationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_registration(row: RegistrationRow) -> Result<Registration> {
        Ok(Registration {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            trip_id: Uuid::parse_str(&row.trip_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            participant_id: Uuid::parse_str(&row.participant_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            status: Self::parse_registration_status(&row.status)?,
            participation_status: parse_participation_status(&row.participation_status)?,
            departure_stop: row.departure_stop.as_deref().map(parse_departure_stop).transpose()?,
            participation_note: row.participation_note,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_registration_status(s: &str) -> Result<RegistrationStatus> {
        match s {
            "Active" => Ok(RegistrationStatus::Active),
            "Cancelled" => Ok(RegistrationStatus::Cancelled),
            _ => Err(AppError::Database(format!("Invalid registration status: {}", s))),
        }
    }
}

pub(crate) fn parse_participation_status(s: &str) -> Result<ParticipationStatus> {
    match s {
        "Unconfirmed" => Ok(ParticipationStatus::Unconfirmed),
        "Confirmed" => Ok(ParticipationStatus::Confirmed),
        "NotGoing" => Ok(ParticipationStatus::NotGoing),
        "Other" => Ok(ParticipationStatus::Other),
        _ => Err(AppError::Database(format!("Invalid participation status: {}", s))),
    }
}

pub(crate) fn participation_status_to_str(status: &ParticipationStatus) -> &'static str {
    match status {
        ParticipationStatus::Unconfirmed => "Unconfirmed",
        ParticipationStatus::Confirmed => "Confirmed",
        ParticipationStatus::NotGoing => "NotGoing",
        ParticipationStatus::Other => "Other",
    }
}

pub(crate) fn parse_departure_stop(s: &str) -> Result<DepartureStop> {
    match s {
        "Stop1" => Ok(DepartureStop::Stop1),
        "Stop2" => Ok(DepartureStop::Stop2),
        "Own" => Ok(DepartureStop::Own),
        _ => Err(AppError::Database(format!("Invalid departure stop: {}", s))),
    }
}

pub(crate) fn departure_stop_to_str(stop: &DepartureStop) -> &'static str {
    match stop {
        DepartureStop::Stop1 => "Stop1",
        DepartureStop::Stop2 => "Stop2",
        DepartureStop::Own => "Own",
    }
}

#[async_trait]
impl RegistrationRepository for SqliteRegistrationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, trip_id, participant_id, status, participation_status,
                   departure_stop, participation_note, created_at, updated_at
            FROM registrations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_registration(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_trip_and_participant(
        &self,
        trip_id: Uuid,
        participant_id: Uuid,
    ) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, trip_id, participant_id, status, participation_status,
                   departure_stop, participation_note, created_at, updated_at
            FROM registrations
            WHERE trip_id = ? AND participant_id = ?
            "#,
        )
        .bind(trip_id.to_string())
        .bind(participant_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_registration(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_trip(&self, trip_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT id, trip_id, participant_id, status, participation_status,
                   departure_stop, participation_note, created_at, updated_at
            FROM registrations
            WHERE trip_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(trip_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_registration).collect()
    }

    async fn upsert(&self, registration: UpsertRegistration) -> Result<Registration> {
        let now = Utc::now().naive_utc();
        let id = Uuid::new_v4();

        // ON CONFLICT on the (trip_id, participant_id) unique key keeps one
        // row per pair even under concurrent first-time status changes.
        sqlx::query(
            r#"
            INSERT INTO registrations (
                id, trip_id, participant_id, status, participation_status,
                departure_stop, participation_note, created_at, updated_at
            ) VALUES (?, ?, ?, 'Active', ?, ?, ?, ?, ?)
            ON CONFLICT (trip_id, participant_id) DO UPDATE SET
                participation_status = excluded.participation_status,
                departure_stop = excluded.departure_stop,
                participation_note = excluded.participation_note,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(id.to_string())
        .bind(registration.trip_id.to_string())
        .bind(registration.participant_id.to_string())
        .bind(participation_status_to_str(&registration.participation_status))
        .bind(registration.departure_stop.as_ref().map(departure_stop_to_str))
        .bind(&registration.participation_note)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_trip_and_participant(registration.trip_id, registration.participant_id)
            .await?
            .ok_or_else(|| {
                AppError::Database("Failed to retrieve upserted registration".to_string())
            })
    }
}
