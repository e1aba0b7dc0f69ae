use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::backend::ChatBackend;
use super::context::{self, PatientContextSnapshot};
use super::types::*;
use super::{fallback, prompt, GatewayConfig, GatewayError};
use crate::db::repository;
use crate::models::enums::MessageRole;
use crate::models::{ChatMessage, MODEL_FALLBACK};

/// Entry point for one chat turn: context, prompt, backend selection,
/// fallback, persistence.
pub struct ChatGateway {
    config: GatewayConfig,
    backend: Arc<dyn ChatBackend>,
    db: Arc<Mutex<Connection>>,
}

impl ChatGateway {
    pub fn new(
        config: GatewayConfig,
        backend: Arc<dyn ChatBackend>,
        db: Arc<Mutex<Connection>>,
    ) -> Self {
        Self { config, backend, db }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run one turn. Never fails: errors in the request path become the
    /// per-language apology reply.
    pub async fn chat(&self, request: ChatRequest) -> ChatReply {
        let session_id = request.session_id.clone();
        let language = request.language;

        match self.try_chat(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Chat request failed");
                ChatReply::apology(session_id, language)
            }
        }
    }

    async fn try_chat(&self, request: ChatRequest) -> Result<ChatReply, GatewayError> {
        let received_at = now_micros();

        let (patient_context, messages) = {
            let conn = self.lock_db()?;
            let patient_context = match request.patient_id.as_deref() {
                Some(patient_id) => {
                    context::load_patient_context(&conn, patient_id, self.config.visit_limit)?
                }
                None => PatientContextSnapshot::empty(),
            };
            let history =
                context::load_session_history(&conn, &request.session_id, self.config.history_limit)?;
            let system = prompt::system_prompt(request.language, &patient_context);
            (
                patient_context,
                prompt::build_messages(system, history, &request.message),
            )
        };

        let completion = self
            .complete(&messages, &request.message, request.model.as_deref())
            .await;
        let is_ai_live = completion.is_ai_live();

        {
            let conn = self.lock_db()?;
            let (user_turn, assistant_turn) = turn_pair(&request, &completion, received_at);
            repository::insert_turn_pair(&conn, &user_turn, &assistant_turn)?;
        }

        let context_used = request.patient_id.is_some() && patient_context.has_visits();

        Ok(ChatReply {
            response: completion.text,
            session_id: request.session_id,
            confidence: if is_ai_live { LIVE_CONFIDENCE } else { FALLBACK_CONFIDENCE },
            reasoning: Some(Reasoning::new(is_ai_live, context_used)),
            is_ai_live,
            ai_model_used: Some(completion.model_used),
            attempts: completion.attempts,
        })
    }

    /// Try candidates in order until one answers; otherwise serve the
    /// fallback library. A requested model replaces the candidate list.
    pub async fn complete(
        &self,
        messages: &[PromptMessage],
        user_message: &str,
        requested_model: Option<&str>,
    ) -> Completion {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            tracing::warn!("No completion credential configured, using fallback library");
            return fallback_completion(user_message, Vec::new());
        };

        let candidates: Vec<&str> = match requested_model {
            Some(model) => vec![model],
            None => self.config.candidate_models.iter().map(String::as_str).collect(),
        };

        let mut attempts = Vec::with_capacity(candidates.len());
        for model in candidates {
            let request = CompletionRequest {
                model,
                messages,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };

            let started = Instant::now();
            let result = self.backend.complete(api_key, &request).await;
            let elapsed = started.elapsed();

            match result {
                Ok(text) => {
                    tracing::info!(
                        model = %model,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Completion succeeded"
                    );
                    attempts.push(ModelAttempt {
                        model: model.to_string(),
                        outcome: AttemptOutcome::Success,
                        elapsed,
                    });
                    return Completion {
                        text,
                        model_used: model.to_string(),
                        attempts,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        model = %model,
                        elapsed_ms = elapsed.as_millis() as u64,
                        error = %e,
                        "Completion attempt failed"
                    );
                    attempts.push(ModelAttempt {
                        model: model.to_string(),
                        outcome: AttemptOutcome::from(&e),
                        elapsed,
                    });
                }
            }
        }

        tracing::warn!(
            attempts = attempts.len(),
            "All candidate models failed, using fallback library"
        );
        fallback_completion(user_message, attempts)
    }

    fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, GatewayError> {
        self.db.lock().map_err(|_| GatewayError::LockPoisoned)
    }
}

fn fallback_completion(user_message: &str, attempts: Vec<ModelAttempt>) -> Completion {
    Completion {
        text: fallback::fallback_response(user_message),
        model_used: MODEL_FALLBACK.to_string(),
        attempts,
    }
}

/// Stored timestamps carry microsecond precision.
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn turn_pair(
    request: &ChatRequest,
    completion: &Completion,
    received_at: DateTime<Utc>,
) -> (ChatMessage, ChatMessage) {
    let user_turn = ChatMessage {
        id: Uuid::new_v4(),
        session_id: request.session_id.clone(),
        user_id: request.user_id.clone(),
        patient_id: request.patient_id.clone(),
        role: MessageRole::User,
        content: request.message.clone(),
        language: request.language,
        timestamp: received_at,
        model_used: None,
        is_ai_live: None,
    };

    let answered_at = now_micros().max(received_at + Duration::microseconds(1));
    let assistant_turn = ChatMessage {
        id: Uuid::new_v4(),
        role: MessageRole::Assistant,
        content: completion.text.clone(),
        timestamp: answered_at,
        model_used: Some(completion.model_used.clone()),
        is_ai_live: Some(completion.is_ai_live()),
        ..user_turn.clone()
    };

    (user_turn, assistant_turn)
}
