//! Delivery domain types.
//!
//! Field names serialize in camelCase to match the JSON the tracking UI and
//! the mock snapshot file use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use beezetrack_core::{DeliveryId, DeliveryStatus, TrackingNumber, UserId};

/// A package moving through the BeezeTrack network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: DeliveryId,
    pub tracking_number: TrackingNumber,
    pub package_type: String,
    pub weight: String,
    pub dimensions: String,
    pub from: String,
    pub to: String,
    /// Date the package entered the network, e.g. `March 4, 2025`.
    pub date: String,
    pub status: DeliveryStatus,
    /// Timeline entries, oldest first.
    pub updates: Vec<DeliveryUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<PickupSlot>,
    /// Account that scheduled the delivery. Demo deliveries have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Delivery {
    /// Whether `viewer` may read and modify this delivery.
    ///
    /// Unowned demo deliveries are shared by every account.
    #[must_use]
    pub fn is_visible_to(&self, viewer: UserId) -> bool {
        self.owner_id.is_none_or(|owner| owner == viewer)
    }
}

/// One entry of a delivery timeline.
///
/// `status` is a free-form label: besides the [`DeliveryStatus`] labels it
/// holds values such as `Order Placed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    pub status: String,
    pub date: String,
    pub time: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Requested pickup window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupSlot {
    pub date: String,
    pub time: String,
}

/// A partially specified delivery.
///
/// Every unset field is filled in by the mock generator before insertion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryDraft {
    pub package_type: Option<String>,
    pub weight: Option<String>,
    pub dimensions: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub updates: Option<Vec<DeliveryUpdate>>,
    pub image_url: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<String>,
    pub pickup: Option<PickupSlot>,
}

/// A fully specified delivery that has not been stored yet.
///
/// The store assigns the id and tracking number.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDelivery {
    pub package_type: String,
    pub weight: String,
    pub dimensions: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub status: DeliveryStatus,
    pub updates: Vec<DeliveryUpdate>,
    pub image_url: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<String>,
    pub pickup: Option<PickupSlot>,
    pub owner_id: Option<UserId>,
}

impl From<Delivery> for NewDelivery {
    /// Drop the store-assigned identifiers.
    fn from(delivery: Delivery) -> Self {
        Self {
            package_type: delivery.package_type,
            weight: delivery.weight,
            dimensions: delivery.dimensions,
            from: delivery.from,
            to: delivery.to,
            date: delivery.date,
            status: delivery.status,
            updates: delivery.updates,
            image_url: delivery.image_url,
            carrier: delivery.carrier,
            estimated_delivery: delivery.estimated_delivery,
            pickup: delivery.pickup,
            owner_id: delivery.owner_id,
        }
    }
}

impl NewDelivery {
    /// Attach the identifiers chosen by the store.
    #[must_use]
    pub fn into_delivery(
        self,
        id: DeliveryId,
        tracking_number: TrackingNumber,
        created_at: DateTime<Utc>,
    ) -> Delivery {
        Delivery {
            id,
            tracking_number,
            package_type: self.package_type,
            weight: self.weight,
            dimensions: self.dimensions,
            from: self.from,
            to: self.to,
            date: self.date,
            status: self.status,
            updates: self.updates,
            image_url: self.image_url,
            carrier: self.carrier,
            estimated_delivery: self.estimated_delivery,
            pickup: self.pickup,
            owner_id: self.owner_id,
            created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(owner_id: Option<UserId>) -> Delivery {
        NewDelivery {
            package_type: "Standard Parcel".to_string(),
            weight: "2 lbs".to_string(),
            dimensions: "Standard".to_string(),
            from: "New York, NY".to_string(),
            to: "Los Angeles, CA".to_string(),
            date: "March 4, 2025".to_string(),
            status: DeliveryStatus::Pending,
            updates: Vec::new(),
            image_url: None,
            carrier: None,
            estimated_delivery: None,
            pickup: None,
            owner_id,
        }
        .into_delivery(
            DeliveryId::new(1000),
            TrackingNumber::parse("BZ123456").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_visibility() {
        let alice = UserId::new(1);
        let bob = UserId::new(2);

        assert!(sample(None).is_visible_to(alice));
        assert!(sample(Some(alice)).is_visible_to(alice));
        assert!(!sample(Some(alice)).is_visible_to(bob));
    }

    #[test]
    fn test_serializes_camel_case_and_skips_empty() {
        let json = serde_json::to_value(sample(None)).unwrap();
        assert_eq!(json["trackingNumber"], "BZ123456");
        assert_eq!(json["packageType"], "Standard Parcel");
        assert_eq!(json["status"], "Pending");
        assert!(json.get("imageUrl").is_none());
        assert!(json.get("ownerId").is_none());
    }

    #[test]
    fn test_draft_accepts_partial_json() {
        let draft: DeliveryDraft =
            serde_json::from_str(r#"{"from":"Boston, MA","status":"In-Transit"}"#).unwrap();
        assert_eq!(draft.from.as_deref(), Some("Boston, MA"));
        assert_eq!(draft.status, Some(DeliveryStatus::InTransit));
        assert!(draft.to.is_none());
    }
}
