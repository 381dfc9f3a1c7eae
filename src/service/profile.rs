//! Profile service
//!
//! The only component request handlers call for profile reads and
//! follow graph mutations. Composes account lookup, the follow edge
//! set, and viewer authorization.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::Session;
use crate::data::{Account, Database, Profile};
use crate::error::AppError;

/// Account fields embedded in a profile view when the viewer owns it.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerAccount {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&Account> for OwnerAccount {
    fn from(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            city: account.city.clone(),
            state: account.state.clone(),
            country: account.country.clone(),
            is_staff: account.is_staff,
            is_superuser: account.is_superuser,
        }
    }
}

/// Externally rendered shape of a profile.
///
/// `following` is viewer-relative: whether the authenticated viewer
/// follows this profile (false for anonymous viewers). `account` is
/// present only when the viewer is the profile owner.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub bio: Option<String>,
    pub image: String,
    pub cover: Option<String>,
    pub following: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<OwnerAccount>,
}

/// Profile service
pub struct ProfileService {
    db: Arc<Database>,
    default_image: String,
}

impl ProfileService {
    /// Create new profile service
    ///
    /// # Arguments
    /// * `default_image` - Avatar URL substituted when a profile has none
    pub fn new(db: Arc<Database>, default_image: String) -> Self {
        Self { db, default_image }
    }

    fn not_found(handle: &str) -> AppError {
        AppError::NotFound(format!(
            "A profile with username '{}' does not exist",
            handle
        ))
    }

    fn render(
        &self,
        account: &Account,
        profile: &Profile,
        following: bool,
        viewer: Option<&Session>,
    ) -> ProfileView {
        let is_owner = viewer.is_some_and(|session| session.account_id == account.id);
        ProfileView {
            username: account.username.clone(),
            bio: profile.bio.clone(),
            image: profile
                .image
                .clone()
                .unwrap_or_else(|| self.default_image.clone()),
            cover: profile.cover.clone(),
            following,
            account: is_owner.then(|| OwnerAccount::from(account)),
        }
    }

    async fn load_by_handle(&self, handle: &str) -> Result<(Account, Profile), AppError> {
        let account = self
            .db
            .get_account_by_username(handle)
            .await?
            .ok_or_else(|| Self::not_found(handle))?;
        let profile = self
            .db
            .get_profile(&account.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("profile row missing for account")))?;

        Ok((account, profile))
    }

    async fn viewer_follows(
        &self,
        viewer: Option<&Session>,
        target_id: &str,
    ) -> Result<bool, AppError> {
        match viewer {
            Some(session) => self.db.is_following(&session.account_id, target_id).await,
            None => Ok(false),
        }
    }

    /// Retrieve a profile by handle.
    ///
    /// Anonymous viewers always see `following: false`. The owner
    /// additionally gets their account fields embedded.
    pub async fn retrieve(
        &self,
        handle: &str,
        viewer: Option<&Session>,
    ) -> Result<ProfileView, AppError> {
        let (account, profile) = self.load_by_handle(handle).await?;
        let following = self.viewer_follows(viewer, &account.id).await?;

        Ok(self.render(&account, &profile, following, viewer))
    }

    /// Follow a profile on behalf of the viewer.
    ///
    /// Idempotent: following an already-followed profile succeeds as a
    /// no-op. Self-follow is rejected by value equality on the account
    /// ID, never by instance identity.
    pub async fn follow(&self, viewer: &Session, handle: &str) -> Result<ProfileView, AppError> {
        let (account, profile) = self.load_by_handle(handle).await?;

        if account.id == viewer.account_id {
            return Err(AppError::SelfFollow);
        }

        let inserted = self
            .db
            .insert_follow_if_absent(&viewer.account_id, &account.id)
            .await?;
        if inserted {
            crate::metrics::FOLLOW_EDGES_TOTAL.set(self.db.count_follow_edges().await?);
            tracing::info!(
                follower = %viewer.username,
                followee = %account.username,
                "Follow edge created"
            );
        }

        Ok(self.render(&account, &profile, true, Some(viewer)))
    }

    /// Unfollow a profile on behalf of the viewer.
    ///
    /// Idempotent: unfollowing a profile that is not followed succeeds
    /// as a no-op.
    pub async fn unfollow(&self, viewer: &Session, handle: &str) -> Result<ProfileView, AppError> {
        let (account, profile) = self.load_by_handle(handle).await?;

        let removed = self
            .db
            .delete_follow(&viewer.account_id, &account.id)
            .await?;
        if removed {
            crate::metrics::FOLLOW_EDGES_TOTAL.set(self.db.count_follow_edges().await?);
            tracing::info!(
                follower = %viewer.username,
                followee = %account.username,
                "Follow edge removed"
            );
        }

        Ok(self.render(&account, &profile, false, Some(viewer)))
    }

    /// Enumerate profiles following the given handle.
    pub async fn followers(
        &self,
        handle: &str,
        viewer: Option<&Session>,
    ) -> Result<Vec<ProfileView>, AppError> {
        let (account, _) = self.load_by_handle(handle).await?;
        self.render_many(self.db.follower_ids(&account.id).await?, viewer)
            .await
    }

    /// Enumerate profiles the given handle follows.
    pub async fn following(
        &self,
        handle: &str,
        viewer: Option<&Session>,
    ) -> Result<Vec<ProfileView>, AppError> {
        let (account, _) = self.load_by_handle(handle).await?;
        self.render_many(self.db.following_ids(&account.id).await?, viewer)
            .await
    }

    async fn render_many(
        &self,
        account_ids: Vec<String>,
        viewer: Option<&Session>,
    ) -> Result<Vec<ProfileView>, AppError> {
        let mut views = Vec::with_capacity(account_ids.len());
        for account_id in account_ids {
            // Cascade deletes can race enumeration; skip vanished rows.
            let Some(account) = self.db.get_account_by_id(&account_id).await? else {
                continue;
            };
            let Some(profile) = self.db.get_profile(&account_id).await? else {
                continue;
            };
            let following = self.viewer_follows(viewer, &account.id).await?;
            views.push(self.render(&account, &profile, following, viewer));
        }

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::AccountService;
    use tempfile::TempDir;

    const DEFAULT_IMAGE: &str = "https://static.example.com/default-avatar.jpg";

    async fn create_test_services() -> (ProfileService, AccountService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-profile.db");
        let db = Arc::new(Database::connect(&db_path).await.unwrap());
        (
            ProfileService::new(db.clone(), DEFAULT_IMAGE.to_string()),
            AccountService::new(db),
            temp_dir,
        )
    }

    async fn register(accounts: &AccountService, username: &str) -> Session {
        let account = accounts
            .register(username, &format!("{username}@example.com"), "s3cret-password")
            .await
            .unwrap();
        Session::for_account(&account, 3600)
    }

    #[tokio::test]
    async fn retrieve_unknown_handle_is_not_found() {
        let (profiles, _accounts, _temp_dir) = create_test_services().await;

        let error = profiles.retrieve("doesnotexist", None).await.unwrap_err();
        assert!(matches!(
            error,
            AppError::NotFound(message) if message.contains("doesnotexist")
        ));
    }

    #[tokio::test]
    async fn retrieve_substitutes_default_image() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        register(&accounts, "alice").await;

        let view = profiles.retrieve("alice", None).await.unwrap();
        assert_eq!(view.username, "alice");
        assert_eq!(view.image, DEFAULT_IMAGE);
        assert_eq!(view.bio, None);
        assert!(!view.following);
        assert!(view.account.is_none());
    }

    #[tokio::test]
    async fn owner_view_embeds_account_fields() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        let alice = register(&accounts, "alice").await;
        let bob = register(&accounts, "bob").await;

        let own_view = profiles.retrieve("alice", Some(&alice)).await.unwrap();
        let embedded = own_view.account.expect("owner view embeds account");
        assert_eq!(embedded.email, "alice@example.com");
        assert!(!embedded.is_superuser);

        let other_view = profiles.retrieve("alice", Some(&bob)).await.unwrap();
        assert!(other_view.account.is_none());
    }

    #[tokio::test]
    async fn follow_sets_viewer_relative_flag() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        register(&accounts, "alice").await;
        let bob = register(&accounts, "bob").await;

        let view = profiles.follow(&bob, "alice").await.unwrap();
        assert!(view.following);

        // Viewer-relative: bob sees true, anonymous sees false.
        let as_bob = profiles.retrieve("alice", Some(&bob)).await.unwrap();
        assert!(as_bob.following);
        let anonymous = profiles.retrieve("alice", None).await.unwrap();
        assert!(!anonymous.following);
    }

    #[tokio::test]
    async fn follow_does_not_create_reverse_edge() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        let alice = register(&accounts, "alice").await;
        let bob = register(&accounts, "bob").await;

        profiles.follow(&bob, "alice").await.unwrap();

        let bob_seen_by_alice = profiles.retrieve("bob", Some(&alice)).await.unwrap();
        assert!(!bob_seen_by_alice.following);
    }

    #[tokio::test]
    async fn follow_is_idempotent() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        register(&accounts, "alice").await;
        let bob = register(&accounts, "bob").await;

        profiles.follow(&bob, "alice").await.unwrap();
        profiles.follow(&bob, "alice").await.unwrap();

        let followers = profiles.followers("alice", None).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].username, "bob");
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        let alice = register(&accounts, "alice").await;

        let error = profiles.follow(&alice, "alice").await.unwrap_err();
        assert!(matches!(error, AppError::SelfFollow));

        assert!(profiles.followers("alice", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unfollow_is_idempotent() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        register(&accounts, "alice").await;
        let bob = register(&accounts, "bob").await;

        // Unfollow before any follow: no-op, not an error.
        let view = profiles.unfollow(&bob, "alice").await.unwrap();
        assert!(!view.following);

        profiles.follow(&bob, "alice").await.unwrap();
        let view = profiles.unfollow(&bob, "alice").await.unwrap();
        assert!(!view.following);
        assert!(profiles.followers("alice", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn follow_unknown_handle_is_not_found() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        let bob = register(&accounts, "bob").await;

        let error = profiles.follow(&bob, "doesnotexist").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn enumeration_lists_both_directions() {
        let (profiles, accounts, _temp_dir) = create_test_services().await;
        register(&accounts, "alice").await;
        let bob = register(&accounts, "bob").await;
        let carol = register(&accounts, "carol").await;

        profiles.follow(&bob, "alice").await.unwrap();
        profiles.follow(&carol, "alice").await.unwrap();
        profiles.follow(&bob, "carol").await.unwrap();

        let alice_followers: Vec<String> = profiles
            .followers("alice", None)
            .await
            .unwrap()
            .into_iter()
            .map(|view| view.username)
            .collect();
        assert_eq!(alice_followers.len(), 2);
        assert!(alice_followers.contains(&"bob".to_string()));
        assert!(alice_followers.contains(&"carol".to_string()));

        let bob_following: Vec<String> = profiles
            .following("bob", None)
            .await
            .unwrap()
            .into_iter()
            .map(|view| view.username)
            .collect();
        assert_eq!(bob_following, vec!["alice", "carol"]);
    }
}
