use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, full_name, national_id, age, gender, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            patient.id,
            patient.full_name,
            patient.national_id,
            patient.age,
            patient.gender,
            format_timestamp(&Utc::now()),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &str) -> Result<Option<Patient>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, full_name, national_id, age, gender FROM patients WHERE id = ?1",
        params![id],
        |row| {
            Ok(Patient {
                id: row.get(0)?,
                full_name: row.get(1)?,
                national_id: row.get(2)?,
                age: row.get(3)?,
                gender: row.get(4)?,
            })
        },
    );

    match result {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_visit(conn: &Connection, visit: &PatientVisit) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_visits (id, patient_id, visit_date, symptoms, diagnosis, prescribed_medications, doctor_notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            visit.id,
            visit.patient_id,
            visit.visit_date,
            visit.symptoms,
            visit.diagnosis,
            serde_json::to_string(&visit.prescribed_medications)?,
            visit.doctor_notes,
        ],
    )?;
    Ok(())
}

/// Most recent visits first, at most `limit`.
pub fn get_recent_visits(
    conn: &Connection,
    patient_id: &str,
    limit: usize,
) -> Result<Vec<PatientVisit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, visit_date, symptoms, diagnosis, prescribed_medications, doctor_notes
         FROM patient_visits WHERE patient_id = ?1
         ORDER BY visit_date DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![patient_id, limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
        ))
    })?;

    let mut visits = Vec::new();
    for row in rows {
        let (id, patient_id, visit_date, symptoms, diagnosis, meds_json, doctor_notes) = row?;
        visits.push(PatientVisit {
            id,
            patient_id,
            visit_date,
            symptoms,
            diagnosis,
            prescribed_medications: serde_json::from_str(&meds_json)?,
            doctor_notes,
        });
    }
    Ok(visits)
}
