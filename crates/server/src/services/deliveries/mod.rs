//! Delivery service.
//!
//! Creates, tracks and updates deliveries and derives dashboard statistics
//! from whatever the store currently holds.

pub mod generator;
pub mod schedule;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::{info, instrument, warn};

use beezetrack_core::{
    DeliveryId, DeliveryStatistics, DeliveryStatus, TrackingNumber, TrackingNumberError, UserId,
};

pub use schedule::{ORDER_PLACED, PackageKind, PickupWindow, ScheduleRequest};

use crate::db::RepositoryError;
use crate::models::delivery::{Delivery, DeliveryDraft, DeliveryUpdate};
use crate::store::DataStore;

/// Errors that can occur during delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No delivery with that ID or tracking number.
    #[error("Delivery not found")]
    NotFound,

    /// The delivery belongs to another account.
    #[error("Unauthorized")]
    Forbidden,

    /// Tracking number is malformed.
    #[error("invalid tracking number: {0}")]
    InvalidTrackingNumber(#[from] TrackingNumberError),

    /// Request failed validation.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for DeliveryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Result of a tracking lookup.
#[derive(Debug, Clone)]
pub struct Tracked {
    pub delivery: Delivery,
    /// The delivery was fabricated for an unknown tracking number.
    pub placeholder: bool,
}

/// Delivery service.
pub struct DeliveryService<'a> {
    store: &'a DataStore,
}

impl<'a> DeliveryService<'a> {
    /// Create a new delivery service.
    #[must_use]
    pub const fn new(store: &'a DataStore) -> Self {
        Self { store }
    }

    /// Store a delivery, generating whatever the draft leaves unset.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Repository` if the store fails.
    #[instrument(skip(self, draft))]
    pub async fn add_delivery(
        &self,
        draft: DeliveryDraft,
        owner_id: Option<UserId>,
    ) -> Result<Delivery, DeliveryError> {
        let today = Local::now().date_naive();
        let new = generator::fill_draft(draft, owner_id, today, &mut rand::rng());
        let delivery = self.store.create_delivery(&new).await?;

        info!(
            delivery_id = %delivery.id,
            tracking_number = %delivery.tracking_number,
            "Delivery created"
        );
        Ok(delivery)
    }

    /// Schedule a pickup for `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Validation` if the request is incomplete.
    pub async fn schedule_pickup(
        &self,
        request: ScheduleRequest,
        owner_id: UserId,
    ) -> Result<Delivery, DeliveryError> {
        let now = Local::now().naive_local();
        let draft = request
            .into_draft(now.date(), &generator::format_time(now.time()))
            .map_err(DeliveryError::Validation)?;
        self.add_delivery(draft, Some(owner_id)).await
    }

    /// Look a delivery up by tracking number.
    ///
    /// In mock mode an unknown number yields a fabricated placeholder that is
    /// not stored.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::NotFound` for an unknown number in database mode.
    #[instrument(skip(self))]
    pub async fn track(&self, tracking_number: &str) -> Result<Tracked, DeliveryError> {
        let tracking_number = TrackingNumber::parse(tracking_number)?;

        if let Some(delivery) = self
            .store
            .delivery_by_tracking_number(&tracking_number)
            .await?
        {
            return Ok(Tracked {
                delivery,
                placeholder: false,
            });
        }

        if !self.store.is_mock() {
            return Err(DeliveryError::NotFound);
        }

        warn!(%tracking_number, "Unknown tracking number, returning placeholder delivery");
        let delivery =
            generator::placeholder(tracking_number, Local::now().date_naive(), &mut rand::rng());
        Ok(Tracked {
            delivery,
            placeholder: true,
        })
    }

    /// Deliveries visible to `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Repository` if the store fails.
    pub async fn list(&self, viewer: UserId) -> Result<Vec<Delivery>, DeliveryError> {
        Ok(self.store.visible_deliveries(viewer).await?)
    }

    /// Fetch one delivery.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::NotFound` or `DeliveryError::Forbidden`.
    pub async fn get(&self, id: DeliveryId, viewer: UserId) -> Result<Delivery, DeliveryError> {
        let delivery = self
            .store
            .delivery_by_id(id)
            .await?
            .ok_or(DeliveryError::NotFound)?;

        if !delivery.is_visible_to(viewer) {
            return Err(DeliveryError::Forbidden);
        }
        Ok(delivery)
    }

    /// Set a delivery's status and append a timeline entry stamped now.
    ///
    /// Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::NotFound` or `DeliveryError::Forbidden`.
    #[instrument(skip(self, description))]
    pub async fn update_status(
        &self,
        id: DeliveryId,
        status: DeliveryStatus,
        description: Option<String>,
        viewer: UserId,
    ) -> Result<Delivery, DeliveryError> {
        self.get(id, viewer).await?;

        let now = Local::now().naive_local();
        let delivery = self
            .store
            .update_status(id, status, |previous| {
                status_change_entry(previous, status, description, now)
            })
            .await?;

        info!(delivery_id = %id, %status, "Delivery status updated");
        Ok(delivery)
    }

    /// Replace a delivery's image URL.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::NotFound` or `DeliveryError::Forbidden`.
    pub async fn update_image(
        &self,
        id: DeliveryId,
        image_url: &str,
        viewer: UserId,
    ) -> Result<Delivery, DeliveryError> {
        let mut delivery = self.get(id, viewer).await?;
        self.store.set_image(id, image_url).await?;
        delivery.image_url = Some(image_url.to_string());
        Ok(delivery)
    }

    /// Dashboard statistics over the deliveries visible to `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Repository` if the store fails.
    pub async fn statistics(&self, viewer: UserId) -> Result<DeliveryStatistics, DeliveryError> {
        let statuses = self.store.visible_statuses(viewer).await?;
        Ok(DeliveryStatistics::from_statuses(statuses))
    }
}

/// Timeline entry recorded when a delivery moves to `status`.
///
/// The location is the destination when the package was in transit, the
/// origin otherwise.
#[must_use]
pub fn status_change_entry(
    previous: &Delivery,
    status: DeliveryStatus,
    description: Option<String>,
    now: NaiveDateTime,
) -> DeliveryUpdate {
    let location = if previous.status == DeliveryStatus::InTransit {
        &previous.to
    } else {
        &previous.from
    };

    DeliveryUpdate {
        status: status.as_str().to_string(),
        date: generator::format_date(now.date()),
        time: generator::format_time(now.time()),
        description: description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Package status updated to {status}.")),
        location: Some(location.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::store::MockStore;

    fn mock_store() -> DataStore {
        DataStore::Mock(MockStore::ephemeral(Vec::new()))
    }

    fn demo_store() -> DataStore {
        let today = Local::now().date_naive();
        DataStore::Mock(MockStore::ephemeral(generator::demo_deliveries(
            today,
            &mut rand::rng(),
        )))
    }

    fn viewer() -> UserId {
        UserId::new(1000)
    }

    #[tokio::test]
    async fn test_add_delivery_increments_total() {
        let store = demo_store();
        let service = DeliveryService::new(&store);
        let before = service.statistics(viewer()).await.unwrap();

        service
            .add_delivery(DeliveryDraft::default(), Some(viewer()))
            .await
            .unwrap();

        let after = service.statistics(viewer()).await.unwrap();
        assert_eq!(after.total_deliveries, before.total_deliveries + 1);
    }

    #[tokio::test]
    async fn test_delivered_update_moves_statistics() {
        let store = mock_store();
        let service = DeliveryService::new(&store);
        let delivery = service
            .add_delivery(DeliveryDraft::default(), None)
            .await
            .unwrap();
        assert_eq!(
            service.statistics(viewer()).await.unwrap().on_time_delivery_rate,
            0
        );

        service
            .update_status(delivery.id, DeliveryStatus::Delivered, None, viewer())
            .await
            .unwrap();

        let stats = service.statistics(viewer()).await.unwrap();
        assert_eq!(stats.delivered_deliveries, 1);
        assert_eq!(stats.on_time_delivery_rate, 95);
    }

    #[tokio::test]
    async fn test_update_status_allows_any_transition() {
        let store = mock_store();
        let service = DeliveryService::new(&store);
        let draft = DeliveryDraft {
            status: Some(DeliveryStatus::Delivered),
            ..DeliveryDraft::default()
        };
        let delivery = service.add_delivery(draft, None).await.unwrap();

        let updated = service
            .update_status(delivery.id, DeliveryStatus::Pending, None, viewer())
            .await
            .unwrap();
        assert_eq!(updated.status, DeliveryStatus::Pending);
        assert_eq!(updated.updates.len(), delivery.updates.len() + 1);
        let last = updated.updates.last().unwrap();
        assert_eq!(last.description, "Package status updated to Pending.");
        assert_eq!(last.location.as_deref(), Some(delivery.from.as_str()));
    }

    #[tokio::test]
    async fn test_schedule_pickup() {
        let store = mock_store();
        let service = DeliveryService::new(&store);
        let request = ScheduleRequest {
            pickup_city: "New York".to_string(),
            pickup_state: "NY".to_string(),
            delivery_city: "Los Angeles".to_string(),
            delivery_state: "CA".to_string(),
            weight: "2".to_string(),
            ..ScheduleRequest::default()
        };

        let delivery = service.schedule_pickup(request, viewer()).await.unwrap();

        assert_eq!(delivery.status, DeliveryStatus::Pending);
        assert_eq!(delivery.updates.len(), 1);
        assert_eq!(delivery.updates[0].status, ORDER_PLACED);
        assert_eq!(delivery.owner_id, Some(viewer()));
        assert!(delivery.tracking_number.is_standard());

        let err = service
            .schedule_pickup(ScheduleRequest::default(), viewer())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Validation(_)));
    }

    #[tokio::test]
    async fn test_track_unknown_returns_placeholder_in_mock_mode() {
        let store = mock_store();
        let service = DeliveryService::new(&store);

        let tracked = service.track("UNKNOWN123").await.unwrap();
        assert!(tracked.placeholder);
        assert_eq!(tracked.delivery.tracking_number.as_str(), "UNKNOWN123");

        // Not persisted.
        let stats = service.statistics(viewer()).await.unwrap();
        assert_eq!(stats.total_deliveries, 0);
    }

    #[tokio::test]
    async fn test_track_known_number() {
        let store = demo_store();
        let service = DeliveryService::new(&store);

        let tracked = service.track("bz345678").await.unwrap();
        assert!(!tracked.placeholder);
        assert_eq!(tracked.delivery.status, DeliveryStatus::InTransit);

        assert!(matches!(
            service.track("BZ-1").await,
            Err(DeliveryError::InvalidTrackingNumber(_))
        ));
    }

    #[tokio::test]
    async fn test_other_owners_delivery_is_forbidden() {
        let store = mock_store();
        let service = DeliveryService::new(&store);
        let delivery = service
            .add_delivery(DeliveryDraft::default(), Some(UserId::new(5)))
            .await
            .unwrap();

        assert!(matches!(
            service.get(delivery.id, viewer()).await,
            Err(DeliveryError::Forbidden)
        ));
        assert!(matches!(
            service
                .update_image(delivery.id, "/static/uploads/a.png", viewer())
                .await,
            Err(DeliveryError::Forbidden)
        ));
        assert!(matches!(
            service.get(DeliveryId::new(42), viewer()).await,
            Err(DeliveryError::NotFound)
        ));
    }

    #[test]
    fn test_status_change_entry_location() {
        let mut delivery = generator::placeholder(
            TrackingNumber::parse("BZ111111").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            &mut rand::rng(),
        );
        let now = NaiveDate::from_ymd_opt(2025, 1, 7)
            .unwrap()
            .and_hms_opt(16, 45, 0)
            .unwrap();

        let entry = status_change_entry(&delivery, DeliveryStatus::InTransit, None, now);
        assert_eq!(entry.location.as_deref(), Some(delivery.from.as_str()));
        assert_eq!(entry.date, "January 7, 2025");
        assert_eq!(entry.time, "4:45 PM");
        assert_eq!(entry.status, "In-Transit");

        delivery.status = DeliveryStatus::InTransit;
        let entry = status_change_entry(
            &delivery,
            DeliveryStatus::Delivered,
            Some("Left at front desk".to_string()),
            now,
        );
        assert_eq!(entry.location.as_deref(), Some(delivery.to.as_str()));
        assert_eq!(entry.description, "Left at front desk");
    }
}
