use rusqlite::Connection;

use super::types::PromptMessage;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::MessageRole;
use crate::models::{Patient, PatientVisit};

/// Read-only projection of a patient for one request. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct PatientContextSnapshot {
    pub patient: Option<Patient>,
    /// Most recent first.
    pub recent_visits: Vec<PatientVisit>,
}

impl PatientContextSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_visits(&self) -> bool {
        !self.recent_visits.is_empty()
    }
}

/// Identity fields plus the latest `visit_limit` visits. A missing patient
/// yields an empty snapshot rather than an error.
pub fn load_patient_context(
    conn: &Connection,
    patient_id: &str,
    visit_limit: usize,
) -> Result<PatientContextSnapshot, DatabaseError> {
    let Some(patient) = repository::get_patient(conn, patient_id)? else {
        tracing::debug!(patient_id, "Patient not found, continuing without context");
        return Ok(PatientContextSnapshot::empty());
    };

    let recent_visits = repository::get_recent_visits(conn, patient_id, visit_limit)?;
    Ok(PatientContextSnapshot {
        patient: Some(patient),
        recent_visits,
    })
}

/// Up to `limit` prior turns of the session, oldest first, as prompt pairs.
pub fn load_session_history(
    conn: &Connection,
    session_id: &str,
    limit: usize,
) -> Result<Vec<PromptMessage>, DatabaseError> {
    let turns = repository::get_recent_session_messages(conn, session_id, limit)?;
    Ok(turns
        .into_iter()
        .map(|turn| match turn.role {
            MessageRole::User => PromptMessage::user(turn.content),
            MessageRole::Assistant => PromptMessage::assistant(turn.content),
        })
        .collect())
}
