//! Delivery API routes.
//!
//! ```text
//! POST /api/deliveries              - Create from a draft (201)
//! GET  /api/deliveries              - Deliveries visible to the user
//! POST /api/deliveries/schedule     - Schedule a pickup (201)
//! POST /api/deliveries/track        - Public tracking lookup
//! GET  /api/deliveries/statistics   - Dashboard statistics
//! GET  /api/deliveries/{id}         - One delivery
//! PUT  /api/deliveries/{id}/status  - Change status, append timeline entry
//! POST /api/deliveries/{id}/image   - Upload a package image (multipart `image`)
//! ```

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use beezetrack_core::{DeliveryId, DeliveryStatistics, DeliveryStatus};

use super::{ApiJson, ApiPath};
use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{Delivery, DeliveryDraft};
use crate::services::deliveries::ScheduleRequest;
use crate::services::uploads::UploadError;
use crate::state::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Response carrying one delivery.
#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub delivery: Delivery,
}

/// Response carrying a list of deliveries.
#[derive(Debug, Serialize)]
pub struct DeliveriesResponse {
    pub deliveries: Vec<Delivery>,
}

/// Tracking lookup result.
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub delivery: Delivery,
    /// The delivery was fabricated for an unknown number and is not stored.
    pub placeholder: bool,
}

/// Response carrying dashboard statistics.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub statistics: DeliveryStatistics,
}

/// Tracking lookup body.
///
/// A missing number deserializes as empty and fails tracking-number
/// validation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackRequest {
    pub tracking_number: String,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    pub description: Option<String>,
}

/// Create a delivery; unset fields are generated.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(draft): ApiJson<DeliveryDraft>,
) -> Result<(StatusCode, Json<DeliveryResponse>), AppError> {
    let delivery = state.deliveries().add_delivery(draft, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(DeliveryResponse { delivery })))
}

/// Deliveries visible to the logged-in user.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<DeliveriesResponse>, AppError> {
    let deliveries = state.deliveries().list(user.id).await?;
    Ok(Json(DeliveriesResponse { deliveries }))
}

/// Schedule a pickup.
///
/// # Errors
///
/// Returns 400 if the request is incomplete.
pub async fn schedule(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<ScheduleRequest>,
) -> Result<(StatusCode, Json<DeliveryResponse>), AppError> {
    let delivery = state
        .deliveries()
        .schedule_pickup(request, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(DeliveryResponse { delivery })))
}

/// Look a delivery up by tracking number. No login required.
///
/// # Errors
///
/// Returns 400 for a malformed number and 404 for an unknown one outside
/// mock mode.
#[instrument(skip_all, fields(tracking_number = %request.tracking_number))]
pub async fn track(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TrackRequest>,
) -> Result<Json<TrackResponse>, AppError> {
    let tracked = state.deliveries().track(&request.tracking_number).await?;
    Ok(Json(TrackResponse {
        delivery: tracked.delivery,
        placeholder: tracked.placeholder,
    }))
}

/// Statistics over the deliveries visible to the logged-in user.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn statistics(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<StatisticsResponse>, AppError> {
    let statistics = state.deliveries().statistics(user.id).await?;
    Ok(Json(StatisticsResponse { statistics }))
}

/// Fetch one delivery.
///
/// # Errors
///
/// Returns 404 if it does not exist and 403 if it belongs to someone else.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let delivery = state.deliveries().get(DeliveryId::new(id), user.id).await?;
    Ok(Json(DeliveryResponse { delivery }))
}

/// Change a delivery's status.
///
/// # Errors
///
/// Returns 400 for an unknown status, 404 or 403 as for [`show`].
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<StatusUpdateRequest>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let status: DeliveryStatus = request
        .status
        .parse()
        .map_err(|e: beezetrack_core::InvalidStatus| AppError::BadRequest(e.to_string()))?;

    let delivery = state
        .deliveries()
        .update_status(DeliveryId::new(id), status, request.description, user.id)
        .await?;
    Ok(Json(DeliveryResponse { delivery }))
}

/// Upload a package image and attach it to the delivery.
///
/// # Errors
///
/// Returns 400 without an `image` field or for a non-image file, 413 past
/// the size limit, 404 or 403 as for [`show`].
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<i32>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let mut multipart = multipart?;
    let id = DeliveryId::new(id);
    // Reject foreign deliveries before writing anything to disk.
    state.deliveries().get(id, user.id).await?;

    let max_bytes = state.uploads().max_bytes();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, max_bytes))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(&e, max_bytes))?;

        let url = state.uploads().save(&file_name, &bytes).await?;
        let delivery = state.deliveries().update_image(id, &url, user.id).await?;
        return Ok(Json(DeliveryResponse { delivery }));
    }

    Err(UploadError::Missing.into())
}

fn multipart_error(err: &MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge { max: max_bytes }.into()
    } else {
        AppError::BadRequest(err.body_text())
    }
}
