//! API layer
//!
//! HTTP handlers for:
//! - User registration, login, self-retrieval/update
//! - Profile retrieval and the follow graph
//! - Metrics (Prometheus)

mod dto;
pub mod metrics;
mod profiles;
mod users;

pub use dto::*;

pub use metrics::metrics_router;
pub use profiles::profiles_router;
pub use users::users_router;
