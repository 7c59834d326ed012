//! Contact-request lifecycle and the collaborators it drives.

mod audit;
mod lifecycle;

pub use audit::*;
pub use lifecycle::*;
