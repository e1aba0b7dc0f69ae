//! Audit logging middleware.
//!
//! Logs every authenticated API request with user id, method, path and
//! response status. Runs innermost (after auth has injected `AuthUser`).

use axum::extract::OriginalUri;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::{ApiContext, AuthUser};

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    // Nested routers see a stripped URI; audit the path the client sent.
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let user_id = req
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.user_id.clone());

    let response = next.run(req).await;
    let status = response.status().as_u16();

    tracing::info!(
        user_id = user_id.as_deref().unwrap_or("-"),
        %method,
        %path,
        status,
        "API access"
    );

    if let Some(ctx) = ctx {
        ctx.core
            .log_access(user_id.as_deref(), &format!("{method} {path}"), &format!("status:{status}"));
    }

    response
}
