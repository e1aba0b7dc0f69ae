//! Shared types for the HTTP API layer.

use std::sync::Arc;

use base64::Engine;
use chrono::{Duration, Utc};
use rusqlite::Connection;

use crate::core_state::CoreState;
use crate::db::{repository, DatabaseError};
use crate::models::enums::UserRole;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware after successful token validation.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
}

/// SHA-256 of a bearer token, URL-safe base64 encoded. Only hashes are stored.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Create and store a token for `user_id`; returns the plaintext once.
pub fn issue_token(
    conn: &Connection,
    user_id: &str,
    ttl: Option<Duration>,
) -> Result<String, DatabaseError> {
    let token = generate_token();
    let expires_at = ttl.map(|ttl| Utc::now() + ttl);
    repository::insert_api_token(conn, &hash_token(&token), user_id, expires_at)?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::models::User;

    fn seed_user(conn: &Connection) {
        repository::insert_user(
            conn,
            &User {
                id: "u1".into(),
                username: "dr.mukamana".into(),
                email: "mukamana@clinic.rw".into(),
                role: UserRole::Doctor,
                is_active: true,
                created_at: Utc::now(),
            },
        )
        .unwrap();
    }

    #[test]
    fn hash_is_deterministic_and_hides_token() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
        assert_ne!(hash_token("a"), hash_token("b"));
    }

    #[test]
    fn generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
        assert_eq!(generate_token().len(), 43);
    }

    #[test]
    fn issued_token_resolves_to_user() {
        let conn = open_memory_database().unwrap();
        seed_user(&conn);
        let token = issue_token(&conn, "u1", Some(Duration::hours(1))).unwrap();
        let user = repository::find_user_by_token_hash(&conn, &hash_token(&token), Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "dr.mukamana");
    }

    #[test]
    fn expired_token_does_not_resolve() {
        let conn = open_memory_database().unwrap();
        seed_user(&conn);
        let token = issue_token(&conn, "u1", Some(Duration::seconds(-1))).unwrap();
        let user =
            repository::find_user_by_token_hash(&conn, &hash_token(&token), Utc::now()).unwrap();
        assert!(user.is_none());
    }
}
