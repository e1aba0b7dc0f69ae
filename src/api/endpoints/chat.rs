//! Chat endpoints.
//!
//! - `POST /api/ai/chat`: one turn through the completion gateway
//! - `GET /api/ai/chat/history/:session_id`: stored turns, oldest first

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::db::repository;
use crate::gateway::{ChatReply, ChatRequest};
use crate::models::enums::{Language, MessageRole};
use crate::models::format_timestamp;

#[derive(Deserialize)]
pub struct ChatSendRequest {
    pub message: String,
    pub session_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `POST /api/ai/chat`: always answers; failures surface as the apology reply.
/// The session id is opaque and passed through as given, even when empty.
pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ChatSendRequest>,
) -> Json<ChatReply> {
    let request = ChatRequest {
        message: req.message,
        session_id: req.session_id,
        patient_id: non_blank(req.patient_id),
        language: Language::from_tag(req.language.as_deref()),
        model: non_blank(req.model),
        user_id: Some(user.user_id),
    };

    Json(ctx.core.gateway().chat(request).await)
}

#[derive(Serialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: MessageRole,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ai_live: Option<bool>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryEntry>,
}

/// `GET /api/ai/chat/history/:session_id`: an unknown session is an empty list.
pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(_user): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let conn = ctx.core.lock_db()?;
    let messages = repository::get_session_messages(&conn, &session_id)?
        .into_iter()
        .map(|m| HistoryEntry {
            kind: m.role,
            message: m.content,
            timestamp: format_timestamp(&m.timestamp),
            model_used: m.model_used,
            is_ai_live: m.is_ai_live,
        })
        .collect();

    Ok(Json(HistoryResponse { messages }))
}
