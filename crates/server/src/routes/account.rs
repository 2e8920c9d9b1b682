//! Profile and settings pages.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::PageQuery;
use crate::error::AppError;
use crate::middleware::{RequireAuth, refresh_current_user};
use crate::models::{CurrentUser, ProfileChanges, User};
use crate::services::auth::PasswordChange;
use crate::state::AppState;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub account: User,
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/settings.html")]
pub struct SettingsTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Display the profile form.
///
/// # Errors
///
/// Returns `AppError` if the account cannot be loaded.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<ProfileTemplate, AppError> {
    let account = state.auth().current_user(current.id).await?;

    Ok(ProfileTemplate {
        user: Some(current),
        error: query.error_message(),
        notice: query.notice_message(),
        account,
    })
}

/// Handle profile form submission.
///
/// # Errors
///
/// Returns `AppError` if the account cannot be reloaded after a failed update.
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(changes): Form<ProfileChanges>,
) -> Result<Response, AppError> {
    let auth = state.auth();

    match auth.update_profile(current.id, &changes).await {
        Ok(user) => {
            if let Err(e) = refresh_current_user(&session, &CurrentUser::from(&user)).await {
                tracing::error!("Failed to refresh session: {}", e);
            }
            Ok(Redirect::to("/profile?notice=profile_saved").into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            let account = auth.current_user(current.id).await?;
            Ok((
                err.status(),
                ProfileTemplate {
                    user: Some(current),
                    error: Some(err.client_message()),
                    notice: None,
                    account,
                },
            )
                .into_response())
        }
    }
}

/// Display the settings page.
pub async fn settings(
    RequireAuth(current): RequireAuth,
    Query(query): Query<PageQuery>,
) -> SettingsTemplate {
    SettingsTemplate {
        user: Some(current),
        error: query.error_message(),
        notice: query.notice_message(),
    }
}

/// Handle password change form submission.
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(change): Form<PasswordChange>,
) -> Response {
    match state.auth().change_password(current.id, &change).await {
        Ok(()) => Redirect::to("/settings?notice=password_changed").into_response(),
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            (
                err.status(),
                SettingsTemplate {
                    user: Some(current),
                    error: Some(err.client_message()),
                    notice: None,
                },
            )
                .into_response()
        }
    }
}
