//! User endpoints
//!
//! Registration, login, and self-retrieval/update. Register and login
//! issue a signed session token in the response payload.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};

use super::dto::{
    LoginRequest, RegisterRequest, UpdateUserRequest, UserPayload, UserResponse,
};
use crate::AppState;
use crate::auth::{CurrentUser, Session, create_session_token};
use crate::error::AppError;
use crate::service::AccountPatch;

/// Create users router
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/login", post(login))
        .route("/user", get(current_user).post(update_user))
}

fn issue_token(state: &AppState, account: &crate::data::Account) -> Result<String, AppError> {
    let session = Session::for_account(account, state.config.auth.session_max_age);
    create_session_token(&session, &state.config.auth.session_secret)
}

/// POST /users
///
/// Register a new account. Returns 201 with the user payload and a
/// fresh session token.
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = request.user;
    let account = state
        .accounts
        .register(&user.username, &user.email, &user.password)
        .await?;
    let (account, profile) = state.accounts.current(&account.id).await?;

    let token = issue_token(&state, &account)?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user: UserPayload::from_parts(&account, &profile, Some(token)),
        }),
    ))
}

/// POST /users/login
///
/// Authenticate by email and password. Returns the user payload with
/// a fresh session token.
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let credentials = request.user;
    let account = state
        .accounts
        .login(&credentials.email, &credentials.password)
        .await?;
    let (account, profile) = state.accounts.current(&account.id).await?;

    let token = issue_token(&state, &account)?;

    Ok(Json(UserResponse {
        user: UserPayload::from_parts(&account, &profile, Some(token)),
    }))
}

/// GET /user
///
/// Return the authenticated user's account and profile. No token is
/// re-issued here.
async fn current_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<UserResponse>, AppError> {
    let (account, profile) = state.accounts.current(&session.account_id).await?;

    Ok(Json(UserResponse {
        user: UserPayload::from_parts(&account, &profile, None),
    }))
}

/// POST /user
///
/// Partially update the authenticated user's account and profile.
/// Omitted fields are unchanged.
async fn update_user(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let patch = request.user;
    let (account, profile) = state
        .accounts
        .update(
            &session.account_id,
            AccountPatch {
                username: patch.username,
                email: patch.email,
                first_name: patch.first_name,
                last_name: patch.last_name,
                city: patch.city,
                state: patch.state,
                country: patch.country,
                bio: patch.bio,
                image: patch.image,
                cover: patch.cover,
            },
        )
        .await?;

    Ok(Json(UserResponse {
        user: UserPayload::from_parts(&account, &profile, None),
    }))
}
