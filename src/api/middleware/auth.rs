//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves the token hash to an
//! active user, and injects `AuthUser` into request extensions for
//! downstream handlers. Rejected requests never reach a handler.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::api::error::ApiError;
use crate::api::types::{hash_token, ApiContext, AuthUser};
use crate::db::repository;

/// Require a valid bearer token belonging to an active user.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let user = {
        let conn = ctx.core.lock_db()?;
        repository::find_user_by_token_hash(&conn, &hash_token(&token), Utc::now())?
    }; // MutexGuard dropped here, before any .await

    let Some(user) = user else {
        tracing::warn!(path = %req.uri().path(), "Rejected bearer token");
        return Err(ApiError::Unauthorized);
    };

    req.extensions_mut().insert(AuthUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
    });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
