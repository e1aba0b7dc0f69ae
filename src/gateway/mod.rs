//! Chat completion gateway.
//!
//! Assembles a clinical prompt (patient context + session history), tries
//! the configured completion models one at a time, and falls back to the
//! canned clinical library when none of them answers. The gateway owns the
//! error boundary of the chat surface: callers always receive a reply.

pub mod backend;
pub mod context;
pub mod fallback;
pub mod orchestrator;
pub mod prompt;
pub mod types;

pub use backend::{ChatBackend, OpenRouterClient};
pub use orchestrator::ChatGateway;
pub use types::*;

use thiserror::Error;

use crate::config::DEFAULT_CANDIDATE_MODELS;
use crate::db::DatabaseError;

/// Failure of a single completion attempt. Never fatal: the gateway moves
/// on to the next candidate.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed completion payload: {0}")]
    MalformedPayload(String),

    #[error("No completion credential configured")]
    MissingCredential,
}

impl From<&BackendError> for AttemptOutcome {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::Timeout(_) => AttemptOutcome::Timeout,
            BackendError::Status { status, .. } => AttemptOutcome::HttpError { status: *status },
            BackendError::Transport(_) | BackendError::MissingCredential => AttemptOutcome::Transport,
            BackendError::MalformedPayload(_) => AttemptOutcome::MalformedPayload,
        }
    }
}

/// Failure anywhere else in the chat request path. Converted to the
/// apology reply at the gateway boundary.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Explicit gateway configuration. The gateway performs no environment
/// lookups of its own.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bearer credential for the completion endpoint. `None` means every
    /// request is served from the fallback library.
    pub api_key: Option<String>,
    /// Tried in order when the caller does not request a model.
    pub candidate_models: Vec<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Prior session turns included in the prompt.
    pub history_limit: usize,
    /// Patient visits included in the context block.
    pub visit_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            candidate_models: DEFAULT_CANDIDATE_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            max_tokens: 1500,
            temperature: 0.7,
            history_limit: 10,
            visit_limit: 3,
        }
    }
}

impl GatewayConfig {
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
