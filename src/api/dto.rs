//! Request and response payloads for the user endpoints.
//!
//! Request bodies arrive wrapped in a top-level `user` object and
//! responses are returned the same way.

use serde::{Deserialize, Serialize};

use crate::data::{Account, Profile};

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub user: RegisterUser,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user: LoginUser,
}

#[derive(Debug, Deserialize)]
pub struct LoginUser {
    pub email: String,
    pub password: String,
}

/// Self-update request body
///
/// Omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub user: UpdateUser,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub cover: Option<String>,
}

/// User response wrapper
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserPayload,
}

/// The authenticated user's own view of their account and profile.
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub cover: Option<String>,
    /// Session token, present when one was issued by this request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl UserPayload {
    /// Build the payload from an account/profile pair.
    pub fn from_parts(account: &Account, profile: &Profile, token: Option<String>) -> Self {
        Self {
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            city: account.city.clone(),
            state: account.state.clone(),
            country: account.country.clone(),
            is_staff: account.is_staff,
            is_superuser: account.is_superuser,
            bio: profile.bio.clone(),
            image: profile.image.clone(),
            cover: profile.cover.clone(),
            token,
        }
    }
}
