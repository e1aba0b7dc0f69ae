//! Repository layer: collection-scoped database operations.
//!
//! Function-based: every operation takes a borrowed `Connection` so callers
//! decide how the connection is shared and when guards are dropped.

mod audit;
mod consultation;
mod conversation;
mod patient;
mod skin;
mod user;

pub use audit::*;
pub use consultation::*;
pub use conversation::*;
pub use patient::*;
pub use skin::*;
pub use user::*;
