//! Clinic service models

pub mod role;
pub mod session;
pub mod setting;
pub mod user;

// Re-export for convenience
pub use role::UserRole;
pub use session::{Session, ValidatedSession};
pub use user::{CurrentUser, NewUser, User};
