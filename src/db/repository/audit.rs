use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// Insert a batch of audit entries into the audit_log table.
pub fn insert_audit_entries(
    conn: &Connection,
    entries: &[(String, Option<String>, String, String)], // (timestamp, user_id, action, outcome)
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO audit_log (timestamp, user_id, action, outcome) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (timestamp, user_id, action, outcome) in entries {
            stmt.execute(params![timestamp, user_id, action, outcome])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Most recent audit entries for one user, newest first.
/// Returns (timestamp, action, outcome) tuples.
pub fn get_audit_entries_for_user(
    conn: &Connection,
    user_id: &str,
    limit: usize,
) -> Result<Vec<(String, String, String)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, action, outcome FROM audit_log
         WHERE user_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![user_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
