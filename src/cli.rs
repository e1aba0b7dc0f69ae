//! Operator commands.
//!
//! The HTTP API has no login or registration surface. Users and bearer
//! tokens are provisioned here, against the same database file the server
//! opens. With no subcommand the binary serves the API.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use uuid::Uuid;

use crate::api::types::issue_token;
use crate::config::{AppConfig, APP_NAME};
use crate::db::{self, repository, DatabaseError};
use crate::models::enums::UserRole;
use crate::models::User;

#[derive(Parser, Debug)]
#[command(name = "medikal", version, about = "Medikal clinical API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Create a user and print its id
    CreateUser {
        username: String,
        #[arg(long)]
        email: String,
        /// patient, doctor or admin
        #[arg(long, default_value = "doctor")]
        role: UserRole,
    },
    /// Issue a bearer token for an active user; the token is printed once
    IssueToken {
        user_id: String,
        /// Token lifetime; omit for a token that does not expire
        #[arg(long)]
        ttl_hours: Option<i64>,
    },
    /// Deactivate a user so that none of their tokens resolve
    DeactivateUser { user_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("No active user with id {0}")]
    UnknownUser(String),
    #[error("Token lifetime must be a positive number of hours, got {0}")]
    InvalidTtl(i64),
}

/// Open the configured database and run one command.
pub fn run(config: &AppConfig, command: Command) -> Result<String, CommandError> {
    let conn = db::open_database(&config.db_path)?;
    tracing::info!(db = %config.db_path.display(), "{APP_NAME} operator command");
    execute(&conn, command)
}

/// Run one command; returns the line to print.
pub fn execute(conn: &Connection, command: Command) -> Result<String, CommandError> {
    match command {
        Command::CreateUser {
            username,
            email,
            role,
        } => {
            let user = User {
                id: Uuid::new_v4().to_string(),
                username,
                email,
                role,
                is_active: true,
                created_at: Utc::now(),
            };
            repository::insert_user(conn, &user)?;
            tracing::info!(user_id = %user.id, role = user.role.as_str(), "User created");
            Ok(user.id)
        }
        Command::IssueToken { user_id, ttl_hours } => {
            let ttl = match ttl_hours {
                None => None,
                Some(hours) => Some(
                    Duration::try_hours(hours)
                        .filter(|ttl| hours > 0 && Utc::now().checked_add_signed(*ttl).is_some())
                        .ok_or(CommandError::InvalidTtl(hours))?,
                ),
            };
            match repository::get_user(conn, &user_id)? {
                Some(user) if user.is_active => {}
                _ => return Err(CommandError::UnknownUser(user_id)),
            }
            let token = issue_token(conn, &user_id, ttl)?;
            tracing::info!(%user_id, expires = ttl.is_some(), "Token issued");
            Ok(token)
        }
        Command::DeactivateUser { user_id } => {
            repository::set_user_active(conn, &user_id, false)?;
            tracing::info!(%user_id, "User deactivated");
            Ok(format!("deactivated {user_id}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::hash_token;
    use crate::db::open_memory_database;

    fn parse(args: &[&str]) -> Option<Command> {
        Cli::try_parse_from(args).unwrap().command
    }

    fn create_doctor(conn: &Connection) -> String {
        execute(
            conn,
            Command::CreateUser {
                username: "dr.mugisha".into(),
                email: "mugisha@clinic.rw".into(),
                role: UserRole::Doctor,
            },
        )
        .unwrap()
    }

    #[test]
    fn no_subcommand_means_serve() {
        assert_eq!(parse(&["medikal"]), None);
    }

    #[test]
    fn subcommands_parse() {
        assert_eq!(
            parse(&["medikal", "issue-token", "u1", "--ttl-hours", "12"]),
            Some(Command::IssueToken {
                user_id: "u1".into(),
                ttl_hours: Some(12),
            })
        );
        assert_eq!(
            parse(&["medikal", "create-user", "keza", "--email", "keza@clinic.rw"]),
            Some(Command::CreateUser {
                username: "keza".into(),
                email: "keza@clinic.rw".into(),
                role: UserRole::Doctor,
            })
        );
        assert_eq!(
            parse(&["medikal", "create-user", "root", "--email", "a@b.rw", "--role", "admin"]),
            Some(Command::CreateUser {
                username: "root".into(),
                email: "a@b.rw".into(),
                role: UserRole::Admin,
            })
        );
    }

    #[test]
    fn unknown_role_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["medikal", "create-user", "x", "--email", "x@y", "--role", "nurse"]).is_err());
    }

    #[test]
    fn issued_token_authenticates_the_new_user() {
        let conn = open_memory_database().unwrap();
        let user_id = create_doctor(&conn);

        let token = execute(
            &conn,
            Command::IssueToken {
                user_id: user_id.clone(),
                ttl_hours: Some(24),
            },
        )
        .unwrap();

        let user = repository::find_user_by_token_hash(&conn, &hash_token(&token), Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.role, UserRole::Doctor);
    }

    #[test]
    fn token_for_unknown_or_inactive_user_is_refused() {
        let conn = open_memory_database().unwrap();
        let err = execute(
            &conn,
            Command::IssueToken {
                user_id: "ghost".into(),
                ttl_hours: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::UnknownUser(id) if id == "ghost"));

        let user_id = create_doctor(&conn);
        execute(&conn, Command::DeactivateUser { user_id: user_id.clone() }).unwrap();
        let err = execute(&conn, Command::IssueToken { user_id, ttl_hours: None }).unwrap_err();
        assert!(matches!(err, CommandError::UnknownUser(_)));
    }

    #[test]
    fn non_positive_ttl_is_refused() {
        let conn = open_memory_database().unwrap();
        let user_id = create_doctor(&conn);
        for hours in [0, -5, i64::MAX] {
            let err = execute(
                &conn,
                Command::IssueToken {
                    user_id: user_id.clone(),
                    ttl_hours: Some(hours),
                },
            )
            .unwrap_err();
            assert!(matches!(err, CommandError::InvalidTtl(h) if h == hours));
        }
    }

    #[test]
    fn deactivation_revokes_existing_tokens() {
        let conn = open_memory_database().unwrap();
        let user_id = create_doctor(&conn);
        let token = execute(
            &conn,
            Command::IssueToken {
                user_id: user_id.clone(),
                ttl_hours: None,
            },
        )
        .unwrap();

        execute(&conn, Command::DeactivateUser { user_id }).unwrap();
        assert!(repository::find_user_by_token_hash(&conn, &hash_token(&token), Utc::now())
            .unwrap()
            .is_none());
    }

    #[test]
    fn duplicate_username_is_a_database_error() {
        let conn = open_memory_database().unwrap();
        create_doctor(&conn);
        let err = execute(
            &conn,
            Command::CreateUser {
                username: "dr.mugisha".into(),
                email: "other@clinic.rw".into(),
                role: UserRole::Doctor,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::Database(_)));
    }

    #[test]
    fn commands_run_against_the_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("medikal.db").to_string_lossy().to_string();
        let config =
            AppConfig::from_lookup(|k| (k == "MEDIKAL_DB_PATH").then(|| raw_path.clone())).unwrap();

        let user_id = run(
            &config,
            Command::CreateUser {
                username: "keza".into(),
                email: "keza@clinic.rw".into(),
                role: UserRole::Admin,
            },
        )
        .unwrap();
        let token = run(&config, Command::IssueToken { user_id, ttl_hours: None }).unwrap();

        let conn = db::open_database(&config.db_path).unwrap();
        assert!(repository::find_user_by_token_hash(&conn, &hash_token(&token), Utc::now())
            .unwrap()
            .is_some());
    }
}
