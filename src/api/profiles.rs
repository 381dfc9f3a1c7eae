//! Profile endpoints
//!
//! Public profile retrieval plus the follow graph surface. Follow and
//! unfollow require authentication; retrieval and enumeration accept
//! anonymous viewers.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
};

use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::ProfileView;

/// Create profiles router
pub fn profiles_router() -> Router<AppState> {
    Router::new()
        .route("/profiles/:username", get(get_profile))
        .route(
            "/profiles/:username/follow",
            axum::routing::post(follow_profile).delete(unfollow_profile),
        )
        .route("/profiles/:username/followers", get(get_followers))
        .route("/profiles/:username/following", get(get_following))
}

/// GET /profiles/:username
///
/// Public. `following` reflects the authenticated viewer when one is
/// present, otherwise false.
async fn get_profile(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileView>, AppError> {
    let view = state
        .profiles
        .retrieve(&username, session.as_ref())
        .await?;

    Ok(Json(view))
}

/// POST /profiles/:username/follow
///
/// Follow the target profile. Idempotent; self-follow is a 400.
async fn follow_profile(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(username): Path<String>,
) -> Result<(StatusCode, Json<ProfileView>), AppError> {
    let view = state.profiles.follow(&session, &username).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /profiles/:username/follow
///
/// Unfollow the target profile. Idempotent.
async fn unfollow_profile(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<ProfileView>, AppError> {
    let view = state.profiles.unfollow(&session, &username).await?;

    Ok(Json(view))
}

/// GET /profiles/:username/followers
async fn get_followers(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(username): Path<String>,
) -> Result<Json<Vec<ProfileView>>, AppError> {
    let views = state
        .profiles
        .followers(&username, session.as_ref())
        .await?;

    Ok(Json(views))
}

/// GET /profiles/:username/following
async fn get_following(
    State(state): State<AppState>,
    MaybeUser(session): MaybeUser,
    Path(username): Path<String>,
) -> Result<Json<Vec<ProfileView>>, AppError> {
    let views = state
        .profiles
        .following(&username, session.as_ref())
        .await?;

    Ok(Json(views))
}
