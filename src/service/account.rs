//! Account service
//!
//! Handles registration, login, and self-update of user accounts.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::password::{hash_password, verify_password};
use crate::data::{Account, Database, EntityId, Profile};
use crate::error::AppError;

const MIN_PASSWORD_LENGTH: usize = 8;

fn normalize_optional_text(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Partial update of account and profile fields.
///
/// `None` fields are left unchanged. Authorization flags are
/// deliberately absent: they are not self-assignable.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
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

/// Account service
pub struct AccountService {
    db: Arc<Database>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Register a new account
    ///
    /// Creates the account and its empty profile in one transaction.
    ///
    /// # Errors
    /// Returns `Validation` for empty/malformed fields and for
    /// usernames or emails already taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username cannot be empty".to_string()));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "username cannot contain whitespace".to_string(),
            ));
        }

        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation(
                "email must be a valid address".to_string(),
            ));
        }

        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        // Fast-path guards before expensive hashing. The UNIQUE
        // constraints remain the authoritative check under race.
        if self.db.get_account_by_username(username).await?.is_some() {
            return Err(AppError::Validation(
                "username is already taken".to_string(),
            ));
        }
        if self.db.get_account_by_email(email).await?.is_some() {
            return Err(AppError::Validation(
                "email is already registered".to_string(),
            ));
        }

        let password_owned = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password_owned))
            .await
            .map_err(|e| AppError::Internal(e.into()))??;

        let now = Utc::now();
        let account = Account {
            id: EntityId::new().0,
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            first_name: None,
            last_name: None,
            city: None,
            state: None,
            country: None,
            is_staff: false,
            is_superuser: false,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_account_with_profile(&account).await?;

        crate::metrics::ACCOUNTS_TOTAL.set(self.db.count_accounts().await?);

        tracing::info!(username = %account.username, "Account registered");

        Ok(account)
    }

    /// Authenticate by email and password
    ///
    /// # Errors
    /// Returns `Unauthorized` for unknown email and wrong password
    /// alike; callers cannot distinguish the two.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let account = self
            .db
            .get_account_by_email(email.trim())
            .await?
            .ok_or(AppError::Unauthorized)?;

        let password_owned = password.to_string();
        let stored_hash = account.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password_owned, &stored_hash))
                .await
                .map_err(|e| AppError::Internal(e.into()))??;

        if !matches {
            return Err(AppError::Unauthorized);
        }

        Ok(account)
    }

    /// Load the account and profile behind an authenticated session.
    pub async fn current(&self, account_id: &str) -> Result<(Account, Profile), AppError> {
        let account = self
            .db
            .get_account_by_id(account_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let profile = self
            .db
            .get_profile(account_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("profile row missing for account")))?;

        Ok((account, profile))
    }

    /// Apply a partial self-update to account and profile fields.
    ///
    /// Omitted fields are unchanged. Changing username or email
    /// re-checks uniqueness.
    pub async fn update(
        &self,
        account_id: &str,
        patch: AccountPatch,
    ) -> Result<(Account, Profile), AppError> {
        let (mut account, mut profile) = self.current(account_id).await?;

        if let Some(username) = patch.username {
            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(AppError::Validation("username cannot be empty".to_string()));
            }
            if username != account.username {
                if self.db.get_account_by_username(&username).await?.is_some() {
                    return Err(AppError::Validation(
                        "username is already taken".to_string(),
                    ));
                }
                account.username = username;
            }
        }

        if let Some(email) = patch.email {
            let email = email.trim().to_string();
            if email.is_empty() || !email.contains('@') {
                return Err(AppError::Validation(
                    "email must be a valid address".to_string(),
                ));
            }
            if email != account.email {
                if self.db.get_account_by_email(&email).await?.is_some() {
                    return Err(AppError::Validation(
                        "email is already registered".to_string(),
                    ));
                }
                account.email = email;
            }
        }

        if let Some(first_name) = patch.first_name {
            account.first_name = normalize_optional_text(first_name);
        }
        if let Some(last_name) = patch.last_name {
            account.last_name = normalize_optional_text(last_name);
        }
        if let Some(city) = patch.city {
            account.city = normalize_optional_text(city);
        }
        if let Some(state) = patch.state {
            account.state = normalize_optional_text(state);
        }
        if let Some(country) = patch.country {
            account.country = normalize_optional_text(country);
        }

        if let Some(bio) = patch.bio {
            profile.bio = normalize_optional_text(bio);
        }
        if let Some(image) = patch.image {
            profile.image = normalize_optional_text(image);
        }
        if let Some(cover) = patch.cover {
            profile.cover = normalize_optional_text(cover);
        }

        let now = Utc::now();
        account.updated_at = now;
        profile.updated_at = now;

        if !self.db.update_account_with_profile(&account, &profile).await? {
            return Err(AppError::NotFound("account no longer exists".to_string()));
        }

        Ok((account, profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_service() -> (AccountService, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-account.db");
        let db = Arc::new(Database::connect(&db_path).await.unwrap());
        (AccountService::new(db.clone()), db, temp_dir)
    }

    #[tokio::test]
    async fn register_creates_account_and_profile() {
        let (service, db, _temp_dir) = create_test_service().await;

        let account = service
            .register(" alice ", "alice@example.com", "s3cret-password")
            .await
            .unwrap();
        assert_eq!(account.username, "alice");
        assert!(account.password_hash.starts_with("$argon2id$"));
        assert!(!account.is_staff);
        assert!(!account.is_superuser);

        let profile = db.get_profile(&account.id).await.unwrap().unwrap();
        assert_eq!(profile.bio, None);
    }

    #[tokio::test]
    async fn register_rejects_invalid_input() {
        let (service, _db, _temp_dir) = create_test_service().await;

        let empty = service
            .register("", "a@example.com", "s3cret-password")
            .await
            .unwrap_err();
        assert!(matches!(empty, AppError::Validation(_)));

        let spaced = service
            .register("two words", "a@example.com", "s3cret-password")
            .await
            .unwrap_err();
        assert!(matches!(spaced, AppError::Validation(_)));

        let bad_email = service
            .register("alice", "not-an-email", "s3cret-password")
            .await
            .unwrap_err();
        assert!(matches!(bad_email, AppError::Validation(_)));

        let short = service
            .register("alice", "a@example.com", "short")
            .await
            .unwrap_err();
        assert!(matches!(short, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn register_rejects_duplicates() {
        let (service, _db, _temp_dir) = create_test_service().await;

        service
            .register("alice", "alice@example.com", "s3cret-password")
            .await
            .unwrap();

        let username_taken = service
            .register("alice", "other@example.com", "s3cret-password")
            .await
            .unwrap_err();
        assert!(matches!(
            username_taken,
            AppError::Validation(message) if message.contains("username")
        ));

        let email_taken = service
            .register("bob", "alice@example.com", "s3cret-password")
            .await
            .unwrap_err();
        assert!(matches!(
            email_taken,
            AppError::Validation(message) if message.contains("email")
        ));
    }

    #[tokio::test]
    async fn login_verifies_password() {
        let (service, _db, _temp_dir) = create_test_service().await;

        service
            .register("alice", "alice@example.com", "s3cret-password")
            .await
            .unwrap();

        let account = service
            .login("alice@example.com", "s3cret-password")
            .await
            .unwrap();
        assert_eq!(account.username, "alice");

        let wrong_password = service
            .login("alice@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, AppError::Unauthorized));

        let unknown_email = service
            .login("nobody@example.com", "s3cret-password")
            .await
            .unwrap_err();
        assert!(matches!(unknown_email, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn update_patches_only_provided_fields() {
        let (service, _db, _temp_dir) = create_test_service().await;

        let account = service
            .register("alice", "alice@example.com", "s3cret-password")
            .await
            .unwrap();

        let (updated, profile) = service
            .update(
                &account.id,
                AccountPatch {
                    first_name: Some("Alice".to_string()),
                    bio: Some("  hello  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, Some("Alice".to_string()));
        assert_eq!(updated.username, "alice");
        assert_eq!(profile.bio, Some("hello".to_string()));
        assert_eq!(profile.image, None);

        // A second patch leaves earlier fields alone.
        let (updated, profile) = service
            .update(
                &account.id,
                AccountPatch {
                    country: Some("Iceland".to_string()),
                    image: Some("https://example.com/a.jpg".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, Some("Alice".to_string()));
        assert_eq!(updated.country, Some("Iceland".to_string()));
        assert_eq!(profile.bio, Some("hello".to_string()));
        assert_eq!(profile.image, Some("https://example.com/a.jpg".to_string()));
    }

    #[tokio::test]
    async fn update_rejects_taken_username() {
        let (service, _db, _temp_dir) = create_test_service().await;

        service
            .register("alice", "alice@example.com", "s3cret-password")
            .await
            .unwrap();
        let bob = service
            .register("bob", "bob@example.com", "s3cret-password")
            .await
            .unwrap();

        let error = service
            .update(
                &bob.id,
                AccountPatch {
                    username: Some("alice".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::Validation(_)));
    }
}
