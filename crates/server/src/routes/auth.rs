//! Login, signup and logout pages.
//!
//! Form failures re-render the page with the error; successes redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::{HOME_PATH, PageQuery};
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::SignupRequest;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub name: String,
    pub email: String,
}

/// Display the login page. Logged-in users go straight to the dashboard.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    LoginTemplate {
        user: None,
        error: query.error_message(),
        notice: query.notice_message(),
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth().login(&form.email, &form.password).await {
        Ok(user) => start_session(&session, &user).await,
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            (
                err.status(),
                LoginTemplate {
                    user: None,
                    error: Some(err.client_message()),
                    notice: None,
                    email: form.email,
                },
            )
                .into_response()
        }
    }
}

/// Display the signup page.
pub async fn signup_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PageQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    SignupTemplate {
        user: None,
        error: query.error_message(),
        notice: None,
        name: String::new(),
        email: String::new(),
    }
    .into_response()
}

/// Handle signup form submission.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupRequest>,
) -> Response {
    let name = form.name.clone();
    let email = form.email.clone();

    match state.auth().register(form).await {
        Ok(user) => start_session(&session, &user).await,
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            (
                err.status(),
                SignupTemplate {
                    user: None,
                    error: Some(err.client_message()),
                    notice: None,
                    name,
                    email,
                },
            )
                .into_response()
        }
    }
}

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/login?notice=logged_out").into_response()
}

async fn start_session(session: &Session, user: &User) -> Response {
    if let Err(e) = set_current_user(session, &CurrentUser::from(user)).await {
        tracing::error!("Failed to set session: {}", e);
        return Redirect::to("/login?error=session").into_response();
    }
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Redirect::to(&format!("{HOME_PATH}?notice=welcome")).into_response()
}
