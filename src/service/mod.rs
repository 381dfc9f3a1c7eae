//! Service layer
//!
//! Business logic composing the data layer and auth:
//! - `AccountService`: registration, login, self-update
//! - `ProfileService`: profile views and the follow graph

mod account;
mod profile;

pub use account::{AccountPatch, AccountService};
pub use profile::{OwnerAccount, ProfileService, ProfileView};
