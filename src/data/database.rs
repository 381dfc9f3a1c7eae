//! SQLite database operations
//!
//! All database access goes through this module.
//! Graph mutations are single atomic SQL statements, so the
//! edge-existence invariant holds under concurrent requests without
//! read-then-write races.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::str::FromStr;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let db_path = path.to_str().ok_or_else(|| {
            AppError::Config(format!(
                "database path must be valid UTF-8: {}",
                path.display()
            ))
        })?;

        // Foreign keys must be on for follow-edge cascade deletes.
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account together with its empty profile.
    ///
    /// Both rows are written in one transaction so a profile always
    /// exists for every account.
    pub async fn insert_account_with_profile(&self, account: &Account) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, email, password_hash,
                first_name, last_name, city, state, country,
                is_staff, is_superuser, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.city)
        .bind(&account.state)
        .bind(&account.country)
        .bind(account.is_staff)
        .bind(account.is_superuser)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO profiles (account_id, bio, image, cover, created_at, updated_at) VALUES (?, NULL, NULL, NULL, ?, ?)",
        )
        .bind(&account.id)
        .bind(account.created_at)
        .bind(account.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Get account by ID
    pub async fn get_account_by_id(&self, account_id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by username (case-sensitive, exact match)
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by email
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Update an account and its profile in one transaction.
    ///
    /// Both rows change together or not at all, so a failure between
    /// the two statements cannot leave the profile stale.
    ///
    /// # Returns
    /// `true` if updated, `false` if either row no longer exists.
    pub async fn update_account_with_profile(
        &self,
        account: &Account,
        profile: &Profile,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let account_rows = sqlx::query(
            r#"
            UPDATE accounts
            SET username = ?, email = ?,
                first_name = ?, last_name = ?, city = ?, state = ?, country = ?,
                is_staff = ?, is_superuser = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.city)
        .bind(&account.state)
        .bind(&account.country)
        .bind(account.is_staff)
        .bind(account.is_superuser)
        .bind(account.updated_at)
        .bind(&account.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let profile_rows = sqlx::query(
            r#"
            UPDATE profiles
            SET bio = ?, image = ?, cover = ?, updated_at = ?
            WHERE account_id = ?
            "#,
        )
        .bind(&profile.bio)
        .bind(&profile.image)
        .bind(&profile.cover)
        .bind(profile.updated_at)
        .bind(&profile.account_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if account_rows != 1 || profile_rows != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;

        Ok(true)
    }

    /// Count registered accounts.
    pub async fn count_accounts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// Get the profile owned by an account
    pub async fn get_profile(&self, account_id: &str) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    // =========================================================================
    // Follow graph
    // =========================================================================

    /// Insert a follow edge if it does not already exist.
    ///
    /// `INSERT OR IGNORE` makes the check-and-insert a single atomic
    /// statement, so concurrent follows of the same pair cannot create
    /// duplicates.
    ///
    /// # Returns
    /// `true` if the edge was inserted, `false` if it already existed.
    pub async fn insert_follow_if_absent(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a follow edge.
    ///
    /// Deleting a missing edge is a no-op, not an error.
    ///
    /// # Returns
    /// `true` if an edge was removed, `false` if none existed.
    pub async fn delete_follow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Check whether the edge (follower, followee) exists.
    pub async fn is_following(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Account IDs with an edge pointing to the given account.
    pub async fn follower_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT follower_id FROM follows WHERE followee_id = ? ORDER BY created_at ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Account IDs the given account points to.
    pub async fn following_ids(&self, account_id: &str) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT followee_id FROM follows WHERE follower_id = ? ORDER BY created_at ASC",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Count followers of an account.
    pub async fn count_followers(&self, account_id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followee_id = ?")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count accounts an account follows.
    pub async fn count_following(&self, account_id: &str) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
                .bind(account_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count all follow edges on the instance.
    pub async fn count_follow_edges(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
