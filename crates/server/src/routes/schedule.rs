//! Pickup scheduling page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Local;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::services::deliveries::ScheduleRequest;
use crate::state::AppState;

/// Scheduling form template.
#[derive(Template, WebTemplate)]
#[template(path = "schedule.html")]
pub struct ScheduleTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Earliest pickup date, `YYYY-MM-DD`.
    pub today: String,
}

impl ScheduleTemplate {
    fn new(user: CurrentUser, error: Option<String>) -> Self {
        Self {
            user: Some(user),
            error,
            notice: None,
            today: Local::now().date_naive().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Display the scheduling form.
pub async fn form(RequireAuth(user): RequireAuth) -> ScheduleTemplate {
    ScheduleTemplate::new(user, None)
}

/// Handle a pickup request; success shows the new delivery's tracking page.
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(request): Form<ScheduleRequest>,
) -> Response {
    match state.deliveries().schedule_pickup(request, user.id).await {
        Ok(delivery) => Redirect::to(&format!(
            "/track/{}?notice=scheduled",
            delivery.tracking_number
        ))
        .into_response(),
        Err(e) => {
            let err = AppError::from(e);
            err.report();
            (
                err.status(),
                ScheduleTemplate::new(user, Some(err.client_message())),
            )
                .into_response()
        }
    }
}
