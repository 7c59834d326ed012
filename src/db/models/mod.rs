//! Database models split into domain-specific modules.

pub mod alert;
pub mod audit;
pub mod contact_request;
pub mod message;
pub mod user;

pub use alert::*;
pub use audit::*;
pub use contact_request::*;
pub use message::*;
pub use user::*;
