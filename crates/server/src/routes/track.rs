//! Tracking page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::PageQuery;
use crate::error::AppError;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, Delivery};
use crate::services::deliveries::DeliveryError;
use crate::state::AppState;

/// Tracking page template.
#[derive(Template, WebTemplate)]
#[template(path = "track.html")]
pub struct TrackTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// What the visitor typed.
    pub query: String,
    pub delivery: Option<Delivery>,
    pub placeholder: bool,
}

/// Query parameters for the search form.
#[derive(Debug, Default, Deserialize)]
pub struct TrackQuery {
    pub number: Option<String>,
    pub notice: Option<String>,
}

/// `GET /track?number=...`; without a number only the form is shown.
pub async fn search(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<TrackQuery>,
) -> Response {
    let flash = PageQuery {
        notice: query.notice,
        error: None,
    };
    match query.number.filter(|n| !n.trim().is_empty()) {
        Some(number) => render(&state, user, number, flash.notice_message()).await,
        None => TrackTemplate {
            user,
            error: None,
            notice: flash.notice_message(),
            query: String::new(),
            delivery: None,
            placeholder: false,
        }
        .into_response(),
    }
}

/// `GET /track/{tracking_number}`
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(tracking_number): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    render(&state, user, tracking_number, query.notice_message()).await
}

async fn render(
    state: &AppState,
    user: Option<CurrentUser>,
    number: String,
    notice: Option<String>,
) -> Response {
    match state.deliveries().track(&number).await {
        Ok(tracked) => TrackTemplate {
            user,
            error: None,
            notice,
            query: tracked.delivery.tracking_number.to_string(),
            delivery: Some(tracked.delivery),
            placeholder: tracked.placeholder,
        }
        .into_response(),
        Err(e) => {
            let not_found = matches!(e, DeliveryError::NotFound);
            let err = AppError::from(e);
            err.report();
            let error = if not_found {
                format!("No delivery found for {}", number.trim())
            } else {
                err.client_message()
            };
            (
                err.status(),
                TrackTemplate {
                    user,
                    error: Some(error),
                    notice: None,
                    query: number,
                    delivery: None,
                    placeholder: false,
                },
            )
                .into_response()
        }
    }
}
