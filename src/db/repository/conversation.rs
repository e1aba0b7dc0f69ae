use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

pub fn insert_chat_message(conn: &Connection, msg: &ChatMessage) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO chat_messages (id, session_id, user_id, patient_id, role, content, language, timestamp, model_used, is_ai_live)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            msg.id.to_string(),
            msg.session_id,
            msg.user_id,
            msg.patient_id,
            msg.role.as_str(),
            msg.content,
            msg.language.as_str(),
            format_timestamp(&msg.timestamp),
            msg.model_used,
            msg.is_ai_live.map(|live| live as i32),
        ],
    )?;
    Ok(())
}

/// Append a user turn and its assistant reply atomically, user first.
pub fn insert_turn_pair(
    conn: &Connection,
    user_turn: &ChatMessage,
    assistant_turn: &ChatMessage,
) -> Result<(), DatabaseError> {
    if user_turn.session_id != assistant_turn.session_id {
        return Err(DatabaseError::ConstraintViolation(
            "turn pair spans two sessions".into(),
        ));
    }
    if assistant_turn.timestamp <= user_turn.timestamp {
        return Err(DatabaseError::ConstraintViolation(
            "assistant turn must be later than the user turn".into(),
        ));
    }

    let tx = conn.unchecked_transaction()?;
    insert_chat_message(&tx, user_turn)?;
    insert_chat_message(&tx, assistant_turn)?;
    tx.commit()?;
    Ok(())
}

/// The last `limit` turns of a session, returned oldest-first.
pub fn get_recent_session_messages(
    conn: &Connection,
    session_id: &str,
    limit: usize,
) -> Result<Vec<ChatMessage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, user_id, patient_id, role, content, language, timestamp, model_used, is_ai_live
         FROM chat_messages WHERE session_id = ?1
         ORDER BY timestamp DESC, rowid DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![session_id, limit as i64], map_row)?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(message_from_row(row?)?);
    }
    messages.reverse();
    Ok(messages)
}

/// Every turn of a session, oldest-first.
pub fn get_session_messages(
    conn: &Connection,
    session_id: &str,
) -> Result<Vec<ChatMessage>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, user_id, patient_id, role, content, language, timestamp, model_used, is_ai_live
         FROM chat_messages WHERE session_id = ?1
         ORDER BY timestamp ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![session_id], map_row)?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(message_from_row(row?)?);
    }
    Ok(messages)
}

#[cfg(test)]
pub fn count_session_messages(conn: &Connection, session_id: &str) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM chat_messages WHERE session_id = ?1",
        params![session_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    user_id: Option<String>,
    patient_id: Option<String>,
    role: String,
    content: String,
    language: String,
    timestamp: String,
    model_used: Option<String>,
    is_ai_live: Option<i32>,
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessageRow> {
    Ok(ChatMessageRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_id: row.get(2)?,
        patient_id: row.get(3)?,
        role: row.get(4)?,
        content: row.get(5)?,
        language: row.get(6)?,
        timestamp: row.get(7)?,
        model_used: row.get(8)?,
        is_ai_live: row.get(9)?,
    })
}

fn message_from_row(row: ChatMessageRow) -> Result<ChatMessage, DatabaseError> {
    Ok(ChatMessage {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        session_id: row.session_id,
        user_id: row.user_id,
        patient_id: row.patient_id,
        role: MessageRole::from_str(&row.role)?,
        content: row.content,
        language: Language::from_str(&row.language)?,
        timestamp: DateTime::parse_from_rfc3339(&row.timestamp)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        model_used: row.model_used,
        is_ai_live: row.is_ai_live.map(|live| live != 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use chrono::TimeZone;

    fn turn(session: &str, role: MessageRole, content: &str, second: u32) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            session_id: session.into(),
            user_id: Some("u1".into()),
            patient_id: None,
            role,
            content: content.into(),
            language: Language::En,
            timestamp: Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, second).unwrap(),
            model_used: None,
            is_ai_live: None,
        }
    }

    #[test]
    fn insert_and_read_back_preserves_fields() {
        let conn = open_memory_database().unwrap();
        let mut msg = turn("s1", MessageRole::Assistant, "Hello", 1);
        msg.model_used = Some(MODEL_FALLBACK.into());
        msg.is_ai_live = Some(false);
        insert_chat_message(&conn, &msg).unwrap();

        let stored = get_session_messages(&conn, "s1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, msg.id);
        assert_eq!(stored[0].role, MessageRole::Assistant);
        assert_eq!(stored[0].timestamp, msg.timestamp);
        assert_eq!(stored[0].model_used.as_deref(), Some("fallback"));
        assert_eq!(stored[0].is_ai_live, Some(false));
    }

    #[test]
    fn recent_messages_are_the_latest_in_chronological_order() {
        let conn = open_memory_database().unwrap();
        for i in 0..14u32 {
            let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
            insert_chat_message(&conn, &turn("s1", role, &format!("m{i}"), i)).unwrap();
        }
        insert_chat_message(&conn, &turn("other", MessageRole::User, "x", 30)).unwrap();

        let recent = get_recent_session_messages(&conn, "s1", 10).unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["m4", "m5", "m6", "m7", "m8", "m9", "m10", "m11", "m12", "m13"]
        );
    }

    #[test]
    fn unknown_session_has_no_messages() {
        let conn = open_memory_database().unwrap();
        assert!(get_recent_session_messages(&conn, "nope", 10).unwrap().is_empty());
        assert_eq!(count_session_messages(&conn, "nope").unwrap(), 0);
    }

    #[test]
    fn turn_pair_is_written_user_first() {
        let conn = open_memory_database().unwrap();
        let user = turn("s1", MessageRole::User, "question", 1);
        let assistant = turn("s1", MessageRole::Assistant, "answer", 2);
        insert_turn_pair(&conn, &user, &assistant).unwrap();

        let stored = get_session_messages(&conn, "s1").unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, MessageRole::User);
        assert_eq!(stored[1].role, MessageRole::Assistant);
    }

    #[test]
    fn turn_pair_rejects_mismatched_sessions() {
        let conn = open_memory_database().unwrap();
        let user = turn("s1", MessageRole::User, "question", 1);
        let assistant = turn("s2", MessageRole::Assistant, "answer", 2);
        assert!(insert_turn_pair(&conn, &user, &assistant).is_err());
        assert_eq!(count_session_messages(&conn, "s1").unwrap(), 0);
    }

    #[test]
    fn turn_pair_is_all_or_nothing() {
        let conn = open_memory_database().unwrap();
        let user = turn("s1", MessageRole::User, "question", 1);
        let mut assistant = turn("s1", MessageRole::Assistant, "answer", 2);
        // Duplicate primary key makes the second insert fail.
        assistant.id = user.id;
        assert!(insert_turn_pair(&conn, &user, &assistant).is_err());
        assert_eq!(count_session_messages(&conn, "s1").unwrap(), 0);
    }
}
