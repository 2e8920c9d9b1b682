//! Account API routes.
//!
//! ```text
//! POST /api/auth/register  - Create an account and log in (201)
//! POST /api/auth/login     - Log in
//! POST /api/auth/logout    - Log out (204)
//! GET  /api/auth/me        - Current user
//! PUT  /api/auth/profile   - Partial profile update
//! PUT  /api/auth/password  - Change password
//! ```

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::{ApiJson, session_error};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, refresh_current_user, set_current_user};
use crate::models::{CurrentUser, ProfileChanges, User};
use crate::services::auth::{PasswordChange, SignupRequest};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response carrying the account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Response carrying a confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn start_session(session: &Session, user: &User) -> Result<(), AppError> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| session_error(&e))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and log it in.
///
/// # Errors
///
/// Returns 400 for invalid input and 409 if the email is taken.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.auth().register(request).await?;
    start_session(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// Log in with email and password.
///
/// # Errors
///
/// Returns 401 for wrong credentials.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth().login(&request.email, &request.password).await?;
    start_session(&session, &user).await?;
    Ok(Json(UserResponse { user }))
}

/// Log out. Succeeds whether or not anyone was logged in.
///
/// # Errors
///
/// Returns 500 if the session cannot be deleted.
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in account.
///
/// # Errors
///
/// Returns 401 if the account no longer exists.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth().current_user(current.id).await?;
    Ok(Json(UserResponse { user }))
}

/// Update profile fields; omitted fields are left alone.
///
/// # Errors
///
/// Returns 400 for invalid input and 409 if the new email is taken.
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    ApiJson(changes): ApiJson<ProfileChanges>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.auth().update_profile(current.id, &changes).await?;
    refresh_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| session_error(&e))?;
    Ok(Json(UserResponse { user }))
}

/// Change the account password.
///
/// # Errors
///
/// Returns 400 for a weak or unconfirmed password and 401 if the current
/// password is wrong.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(change): ApiJson<PasswordChange>,
) -> Result<Json<MessageResponse>, AppError> {
    state.auth().change_password(current.id, &change).await?;
    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}
