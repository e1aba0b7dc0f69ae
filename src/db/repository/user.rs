use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::enums::UserRole;
use crate::models::*;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, email, role, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id,
            user.username,
            user.email,
            user.role.as_str(),
            user.is_active as i32,
            format_timestamp(&user.created_at),
        ],
    )?;
    Ok(())
}

pub fn set_user_active(conn: &Connection, user_id: &str, active: bool) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET is_active = ?1 WHERE id = ?2",
        params![active as i32, user_id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "User".into(),
            id: user_id.into(),
        });
    }
    Ok(())
}

/// Store the hash of a bearer token for `user_id`.
pub fn insert_api_token(
    conn: &Connection,
    token_hash: &str,
    user_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO api_tokens (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            token_hash,
            user_id,
            format_timestamp(&Utc::now()),
            expires_at.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(())
}

/// Resolve a token hash to its active, unexpired owner.
pub fn find_user_by_token_hash(
    conn: &Connection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<User>, DatabaseError> {
    let result = conn.query_row(
        "SELECT u.id, u.username, u.email, u.role, u.is_active, u.created_at
         FROM api_tokens t JOIN users u ON u.id = t.user_id
         WHERE t.token_hash = ?1
           AND u.is_active = 1
           AND (t.expires_at IS NULL OR t.expires_at > ?2)",
        params![token_hash, format_timestamp(&now)],
        read_user_row,
    );
    optional_user(result)
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<User>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, username, email, role, is_active, created_at FROM users WHERE id = ?1",
        params![user_id],
        read_user_row,
    );
    optional_user(result)
}

struct UserRow {
    id: String,
    username: String,
    email: String,
    role: String,
    is_active: i32,
    created_at: String,
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn optional_user(result: rusqlite::Result<UserRow>) -> Result<Option<User>, DatabaseError> {
    let row = match result {
        Ok(row) => row,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    Ok(Some(User {
        id: row.id,
        username: row.username,
        email: row.email,
        role: UserRole::from_str(&row.role)?,
        is_active: row.is_active != 0,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn doctor() -> User {
        User {
            id: "u-doc".into(),
            username: "dr.uwase".into(),
            email: "uwase@example.org".into(),
            role: UserRole::Doctor,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn token_resolves_to_user() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &doctor()).unwrap();
        insert_api_token(&conn, "hash-1", "u-doc", None).unwrap();

        let user = find_user_by_token_hash(&conn, "hash-1", Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "dr.uwase");
        assert_eq!(user.role, UserRole::Doctor);
    }

    #[test]
    fn unknown_hash_resolves_to_none() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &doctor()).unwrap();
        assert!(find_user_by_token_hash(&conn, "nope", Utc::now()).unwrap().is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &doctor()).unwrap();
        let expired = Utc::now() - chrono::Duration::minutes(1);
        insert_api_token(&conn, "hash-old", "u-doc", Some(expired)).unwrap();
        assert!(find_user_by_token_hash(&conn, "hash-old", Utc::now()).unwrap().is_none());
    }

    #[test]
    fn inactive_user_is_rejected() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &doctor()).unwrap();
        insert_api_token(&conn, "hash-1", "u-doc", None).unwrap();
        set_user_active(&conn, "u-doc", false).unwrap();
        assert!(find_user_by_token_hash(&conn, "hash-1", Utc::now()).unwrap().is_none());
    }

    #[test]
    fn get_user_sees_inactive_users() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &doctor()).unwrap();
        set_user_active(&conn, "u-doc", false).unwrap();

        let user = get_user(&conn, "u-doc").unwrap().unwrap();
        assert!(!user.is_active);
        assert!(get_user(&conn, "ghost").unwrap().is_none());
    }

    #[test]
    fn deactivating_unknown_user_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = set_user_active(&conn, "ghost", false).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
