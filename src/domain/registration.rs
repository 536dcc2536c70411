use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub participant_id: Uuid,
    pub status: RegistrationStatus,
    pub participation_status: ParticipationStatus,
    pub departure_stop: Option<DepartureStop>,
    pub participation_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Administrative record lifecycle, distinct from the attendance intent below.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq)]
#[sqlx(type_name = "TEXT")]
pub enum RegistrationStatus {
    Active,
    Cancelled,
}

/// Attendance intent for one (trip, participant) pair. `Unconfirmed` also
/// describes the implicit state of a pair with no registration row at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum ParticipationStatus {
    Unconfirmed,
    Confirmed,
    NotGoing,
    Other,
}

/// Which boarding point the participant will use. Stored as its own column;
/// older clients still send it as a `[STOP1]`/`[STOP2]`/`[OWN]` prefix on the
/// note, which `split_legacy_note` strips at the API boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum DepartureStop {
    Stop1,
    Stop2,
    Own,
}

impl DepartureStop {
    pub fn legacy_prefix(&self) -> &'static str {
        match self {
            DepartureStop::Stop1 => "[STOP1]",
            DepartureStop::Stop2 => "[STOP2]",
            DepartureStop::Own => "[OWN]",
        }
    }
}

/// Splits a legacy prefixed note into its stop marker and the free-text rest.
/// Notes without a recognized prefix come back unchanged.
pub fn split_legacy_note(note: &str) -> (Option<DepartureStop>, String) {
    for stop in [DepartureStop::Stop1, DepartureStop::Stop2, DepartureStop::Own] {
        if let Some(rest) = note.strip_prefix(stop.legacy_prefix()) {
            return (Some(stop), rest.trim_start().to_string());
        }
    }
    (None, note.to_string())
}

/// Renders a note in the legacy prefixed form for clients that still expect it.
pub fn join_legacy_note(stop: Option<DepartureStop>, note: Option<&str>) -> Option<String> {
    match (stop, note) {
        (Some(stop), Some(note)) if !note.is_empty() => {
            Some(format!("{} {}", stop.legacy_prefix(), note))
        }
        (Some(stop), _) => Some(stop.legacy_prefix().to_string()),
        (None, Some(note)) if !note.is_empty() => Some(note.to_string()),
        (None, _) => None,
    }
}
