//! Authentication
//!
//! Password hashing, signed session tokens, and request extractors.

pub mod middleware;
pub mod password;
pub mod session;

pub use middleware::{CurrentUser, MaybeUser, require_auth};
pub use session::{Session, create_session_token, verify_session_token};
