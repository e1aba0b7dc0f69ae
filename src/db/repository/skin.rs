use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_skin_analysis(conn: &Connection, analysis: &SkinAnalysis) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO skin_analyses (id, user_id, image_base64, predictions, confidence, recommendation, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            analysis.id,
            analysis.user_id,
            analysis.image_base64,
            serde_json::to_string(&analysis.predictions)?,
            analysis.confidence as f64,
            analysis.recommendation,
            format_timestamp(&analysis.timestamp),
        ],
    )?;
    Ok(())
}

/// A user's analyses, newest first.
pub fn get_skin_analyses_for_user(
    conn: &Connection,
    user_id: &str,
    limit: usize,
) -> Result<Vec<SkinAnalysis>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, image_base64, predictions, confidence, recommendation, timestamp
         FROM skin_analyses WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, f64>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut analyses = Vec::new();
    for row in rows {
        let (id, user_id, image_base64, predictions, confidence, recommendation, timestamp) = row?;
        analyses.push(SkinAnalysis {
            id,
            user_id,
            image_base64,
            predictions: serde_json::from_str(&predictions)?,
            confidence: confidence as f32,
            recommendation,
            timestamp: DateTime::parse_from_rfc3339(&timestamp)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        });
    }
    Ok(analyses)
}
