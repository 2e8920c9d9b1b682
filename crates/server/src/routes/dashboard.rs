//! Dashboard page: statistics and the delivery list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use beezetrack_core::{DeliveryId, DeliveryStatistics, DeliveryStatus};

use super::PageQuery;
use crate::error::AppError;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{CurrentUser, Delivery};
use crate::state::AppState;

/// Dashboard template.
///
/// `statistics` is `None` for anonymous visitors (route guard bypassed).
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub statistics: Option<DeliveryStatistics>,
    pub deliveries: Vec<Delivery>,
    pub statuses: [DeliveryStatus; 4],
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Display the dashboard.
///
/// # Errors
///
/// Returns `AppError` if the store fails.
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<PageQuery>,
) -> Result<DashboardTemplate, AppError> {
    let (statistics, deliveries) = match &user {
        Some(user) => {
            let deliveries = state.deliveries().list(user.id).await?;
            (Some(statistics_for(&deliveries)), deliveries)
        }
        None => (None, Vec::new()),
    };

    Ok(DashboardTemplate {
        user,
        error: query.error_message(),
        notice: query.notice_message(),
        statistics,
        deliveries,
        statuses: DeliveryStatus::ALL,
    })
}

/// Statistics over exactly the deliveries shown.
fn statistics_for(deliveries: &[Delivery]) -> DeliveryStatistics {
    DeliveryStatistics::from_statuses(deliveries.iter().map(|d| d.status))
}

/// Handle the per-row status form.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Response {
    let Ok(status) = form.status.parse::<DeliveryStatus>() else {
        return Redirect::to("/dashboard?error=status").into_response();
    };

    match state
        .deliveries()
        .update_status(DeliveryId::new(id), status, form.description, user.id)
        .await
    {
        Ok(_) => Redirect::to("/dashboard?notice=status_updated").into_response(),
        Err(e) => {
            AppError::from(e).report();
            Redirect::to("/dashboard?error=status").into_response()
        }
    }
}
