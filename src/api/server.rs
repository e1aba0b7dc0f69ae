//! HTTP server lifecycle: bind → spawn background task → return a handle
//! with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use serde::Serialize;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::router::api_router;
use crate::core_state::CoreState;

#[derive(Debug, Clone, Serialize)]
pub struct ApiServerInfo {
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running API server.
pub struct ApiServer {
    pub info: ApiServerInfo,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    /// Signal graceful shutdown.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for in-flight requests to finish.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("API server task failed: {e}");
            }
        }
    }
}

/// CORS policy: any origin when the list is empty, else exactly the listed ones.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(allowed)
}

/// Full application: API routes plus tracing and CORS layers.
pub fn build_app(core: Arc<CoreState>, cors_origins: &[String]) -> Router {
    api_router(core)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

/// Bind `addr`, spawn the server, and return its handle.
pub async fn start_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
    cors_origins: &[String],
) -> Result<ApiServer, std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    let app = build_app(core, cors_origins);

    let info = ApiServerInfo {
        server_addr: local.to_string(),
        port: local.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(addr = %local, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        info,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::gateway::{BackendError, ChatBackend, CompletionRequest, GatewayConfig};
    use async_trait::async_trait;
    use std::net::{IpAddr, Ipv4Addr};

    struct Unused;

    #[async_trait]
    impl ChatBackend for Unused {
        async fn complete(
            &self,
            _api_key: &str,
            _request: &CompletionRequest<'_>,
        ) -> Result<String, BackendError> {
            Err(BackendError::MissingCredential)
        }
    }

    fn test_core() -> Arc<CoreState> {
        Arc::new(CoreState::with_backend(
            open_memory_database().unwrap(),
            GatewayConfig::default(),
            Arc::new(Unused),
        ))
    }

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let server = start_server(test_core(), loopback(), &[]).await.unwrap();
        assert!(server.info.port > 0);

        let url = format!("http://127.0.0.1:{}/api/health", server.info.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let protected = format!("http://127.0.0.1:{}/api/ai/chat/history/s1", server.info.port);
        let resp = reqwest::get(&protected).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        server.stop().await;
    }

    #[tokio::test]
    async fn configured_origin_is_echoed() {
        let origins = vec!["https://clinic.example".to_string()];
        let server = start_server(test_core(), loopback(), &origins).await.unwrap();

        let url = format!("http://127.0.0.1:{}/api/health", server.info.port);
        let resp = reqwest::Client::new()
            .get(&url)
            .header("Origin", "https://clinic.example")
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "https://clinic.example"
        );

        server.stop().await;
    }

    #[test]
    fn invalid_origins_are_skipped() {
        // Building the layer must not panic on a header-invalid origin.
        let _ = cors_layer(&["bad\norigin".to_string(), "https://ok.example".to_string()]);
    }
}
