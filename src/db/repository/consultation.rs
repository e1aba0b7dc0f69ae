use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_consultation(conn: &Connection, consultation: &Consultation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consultations (id, patient_id, created_at, medications) VALUES (?1, ?2, ?3, ?4)",
        params![
            consultation.id,
            consultation.patient_id,
            consultation.created_at,
            serde_json::to_string(&consultation.medications)?,
        ],
    )?;
    Ok(())
}

/// Consultations for a patient, oldest first, at most `limit`.
pub fn get_consultations_by_patient(
    conn: &Connection,
    patient_id: &str,
    limit: usize,
) -> Result<Vec<Consultation>, DatabaseError> {
    query_consultations(
        conn,
        "SELECT id, patient_id, created_at, medications FROM consultations
         WHERE patient_id = ?1 ORDER BY created_at ASC LIMIT ?2",
        patient_id,
        limit,
    )
}

/// The latest `limit` consultations for a patient, newest first.
pub fn get_recent_consultations(
    conn: &Connection,
    patient_id: &str,
    limit: usize,
) -> Result<Vec<Consultation>, DatabaseError> {
    query_consultations(
        conn,
        "SELECT id, patient_id, created_at, medications FROM consultations
         WHERE patient_id = ?1 ORDER BY created_at DESC LIMIT ?2",
        patient_id,
        limit,
    )
}

fn query_consultations(
    conn: &Connection,
    sql: &str,
    patient_id: &str,
    limit: usize,
) -> Result<Vec<Consultation>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt.query_map(params![patient_id, limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut consultations = Vec::new();
    for row in rows {
        let (id, patient_id, created_at, meds_json) = row?;
        consultations.push(Consultation {
            id,
            patient_id,
            created_at,
            medications: serde_json::from_str(&meds_json)?,
        });
    }
    Ok(consultations)
}
