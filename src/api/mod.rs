//! HTTP API.
//!
//! Exposes the chat gateway and the clinical decision-support rules as
//! JSON endpoints. Routes are nested under `/api/`; everything except the
//! health check sits behind bearer-token auth and the audit logger.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ApiServerInfo};
pub use types::ApiContext;
