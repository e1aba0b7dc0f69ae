pub mod conversation;
pub mod enums;
pub mod patient;
pub mod skin;
pub mod user;

pub use conversation::*;
pub use patient::*;
pub use skin::*;
pub use user::*;
