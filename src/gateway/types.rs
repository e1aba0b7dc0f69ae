use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::enums::Language;
use crate::models::{is_live_model, MODEL_ERROR_FALLBACK, MODEL_FALLBACK};

/// Confidence reported for replies from a live model.
pub const LIVE_CONFIDENCE: f32 = 0.85;
/// Confidence reported for replies from the fallback library.
pub const FALLBACK_CONFIDENCE: f32 = 0.70;

/// Evidence labels attached to every non-error reply.
pub const EVIDENCE_SOURCES: &[&str] = &[
    "Patient medical history analysis",
    "Current symptom evaluation",
    "WHO treatment guidelines",
    "AMR surveillance data",
];

/// One inbound chat turn, after request-shape validation.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    pub patient_id: Option<String>,
    pub language: Language,
    /// Restrict the attempt to this model only.
    pub model: Option<String>,
    /// Authenticated author, recorded on both stored turns.
    pub user_id: Option<String>,
}

impl ChatRequest {
    /// Minimal request with default language and no patient.
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
            patient_id: None,
            language: Language::default(),
            model: None,
            user_id: None,
        }
    }
}

/// A `{role, content}` pair as sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".into(), content: content.into() }
    }
}

/// Body of one completion call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [PromptMessage],
    pub max_tokens: u32,
    pub temperature: f32,
}

/// How a single model attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Timeout,
    HttpError { status: u16 },
    Transport,
    MalformedPayload,
}

/// Transient record of one try against one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelAttempt {
    pub model: String,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

impl ModelAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }
}

/// Result of the backend selection step.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    /// A real model id, or [`MODEL_FALLBACK`].
    pub model_used: String,
    pub attempts: Vec<ModelAttempt>,
}

impl Completion {
    pub fn is_ai_live(&self) -> bool {
        is_live_model(&self.model_used)
    }
}

/// Metadata explaining how a reply was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reasoning {
    pub confidence: String,
    pub evidence_sources: Vec<String>,
    pub context_used: bool,
    pub ai_status: String,
}

impl Reasoning {
    pub fn new(is_ai_live: bool, context_used: bool) -> Self {
        Self {
            confidence: if is_ai_live { "85%" } else { "70%" }.to_string(),
            evidence_sources: EVIDENCE_SOURCES.iter().map(|s| s.to_string()).collect(),
            context_used,
            ai_status: if is_ai_live {
                "Live AI"
            } else {
                "Offline - Using clinical guidelines database"
            }
            .to_string(),
        }
    }
}

/// What the chat endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,
    pub is_ai_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_model_used: Option<String>,
    #[serde(skip)]
    pub attempts: Vec<ModelAttempt>,
}

impl ChatReply {
    /// The boundary reply: fixed apology, zero confidence, no reasoning.
    pub fn apology(session_id: String, language: Language) -> Self {
        Self {
            response: super::fallback::apology(language).to_string(),
            session_id,
            confidence: 0.0,
            reasoning: None,
            is_ai_live: false,
            ai_model_used: Some(MODEL_ERROR_FALLBACK.to_string()),
            attempts: Vec::new(),
        }
    }
}
