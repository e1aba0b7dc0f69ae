//! Endpoint handlers, one module per resource.

pub mod amr;
pub mod chat;
pub mod diagnosis;
pub mod health;
pub mod skin;
