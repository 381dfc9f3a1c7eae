//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Account
// =============================================================================

/// A registered user identity
///
/// Usernames and emails are unique across the instance.
/// The password hash is Argon2id PHC format and is opaque everywhere
/// outside the auth module.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    /// Unique handle, case-sensitive
    pub username: String,
    pub email: String,
    /// Argon2id hash (PHC string format)
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Profile
// =============================================================================

/// Public-facing extension of an account
///
/// Exactly one profile exists per account, created in the same
/// transaction as the account row. Holds the account identifier,
/// never a reverse pointer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub account_id: String,
    pub bio: Option<String>,
    /// Avatar URI; a placeholder is substituted at render time when unset
    pub image: Option<String>,
    /// Cover image URI
    pub cover: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Follow relationships
// =============================================================================

/// A directed follower -> followee edge between two profiles
///
/// The (follower_id, followee_id) pair is the primary key, so the
/// edge set is a set, not a multiset. Self-edges are rejected before
/// this struct is ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowEdge {
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}
