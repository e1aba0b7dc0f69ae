//! Transport-agnostic application state.
//!
//! `CoreState` owns the single SQLite connection, the chat gateway built on
//! top of it, and the access audit buffer. Wrapped in `Arc` at startup and
//! shared by every HTTP handler.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db;
use crate::gateway::{BackendError, ChatBackend, ChatGateway, GatewayConfig, OpenRouterClient};
use crate::models::format_timestamp;

/// Maximum audit buffer size before flush.
const AUDIT_BUFFER_CAPACITY: usize = 100;

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    db: Arc<Mutex<Connection>>,
    gateway: ChatGateway,
    audit: AuditLogger,
}

impl CoreState {
    /// Open the configured database and build the live completion client.
    pub fn new(config: &AppConfig) -> Result<Self, CoreError> {
        let conn = db::open_database(&config.db_path)?;
        let backend = OpenRouterClient::new(config.endpoint.clone())?;
        tracing::info!(
            db = %config.db_path.display(),
            endpoint = %config.endpoint.url,
            models = config.gateway.candidate_models.len(),
            ai_configured = config.gateway.has_credential(),
            "Core state ready"
        );
        Ok(Self::with_backend(conn, config.gateway.clone(), Arc::new(backend)))
    }

    /// Assemble state from an open connection and any backend (tests pass
    /// an in-memory database and a fake).
    pub fn with_backend(
        conn: Connection,
        gateway_config: GatewayConfig,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let db = Arc::new(Mutex::new(conn));
        let gateway = ChatGateway::new(gateway_config, backend, db.clone());
        Self {
            db,
            gateway,
            audit: AuditLogger::new(),
        }
    }

    /// Lock the shared connection. Drop the guard before any `.await`.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.db.lock().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn gateway(&self) -> &ChatGateway {
        &self.gateway
    }

    /// Whether a completion credential is configured.
    pub fn ai_configured(&self) -> bool {
        self.gateway.config().has_credential()
    }

    /// Record an API access; flushes to the database once the buffer fills.
    pub fn log_access(&self, user_id: Option<&str>, action: &str, outcome: &str) {
        if self.audit.log(user_id, action, outcome) {
            if let Err(e) = self.flush_audit() {
                tracing::warn!(error = %e, "Failed to flush audit entries");
            }
        }
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }

    /// Write buffered audit entries to the database.
    pub fn flush_audit(&self) -> Result<usize, CoreError> {
        let conn = self.lock_db()?;
        self.audit.flush_to_db(&conn)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Completion client error: {0}")]
    Backend(#[from] BackendError),
}

// ═══════════════════════════════════════════════════════════
// Audit logger
// ═══════════════════════════════════════════════════════════

/// In-memory audit log buffer. Entries are flushed to SQLite
/// when the buffer reaches capacity or on explicit flush.
pub struct AuditLogger {
    buffer: Mutex<Vec<AuditEntry>>,
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub user_id: Option<String>,
    pub action: String,
    pub outcome: String,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(AUDIT_BUFFER_CAPACITY)),
        }
    }

    /// Buffer one entry. Returns `true` once the flush threshold is reached.
    pub fn log(&self, user_id: Option<&str>, action: &str, outcome: &str) -> bool {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.push(AuditEntry {
                timestamp: chrono::Utc::now(),
                user_id: user_id.map(|s| s.to_string()),
                action: action.to_string(),
                outcome: outcome.to_string(),
            });
            buf.len() >= AUDIT_BUFFER_CAPACITY
        } else {
            false
        }
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    pub fn drain(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }

    /// Put entries back ahead of anything logged since they were drained.
    fn requeue(&self, mut entries: Vec<AuditEntry>) {
        if let Ok(mut buf) = self.buffer.lock() {
            entries.append(&mut buf);
            *buf = entries;
        }
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn flush_to_db(&self, conn: &Connection) -> Result<usize, CoreError> {
        let entries = self.drain();
        if entries.is_empty() {
            return Ok(0);
        }

        let tuples: Vec<(String, Option<String>, String, String)> = entries
            .iter()
            .map(|e| {
                (
                    format_timestamp(&e.timestamp),
                    e.user_id.clone(),
                    e.action.clone(),
                    e.outcome.clone(),
                )
            })
            .collect();

        let count = tuples.len();
        if let Err(e) = db::repository::insert_audit_entries(conn, &tuples) {
            self.requeue(entries);
            return Err(e.into());
        }

        tracing::debug!(count, "Flushed audit entries to database");
        Ok(count)
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
