//! Pickup scheduling requests.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::delivery::{DeliveryDraft, DeliveryUpdate, PickupSlot};

use super::generator::format_date;

/// Label of the single timeline entry a scheduled delivery starts with.
pub const ORDER_PLACED: &str = "Order Placed";

/// Kind of package being shipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    #[default]
    Parcel,
    Document,
}

impl PackageKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Parcel => "Standard Parcel",
            Self::Document => "Express Document",
        }
    }
}

/// Preferred pickup window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupWindow {
    #[default]
    Morning,
    Afternoon,
    Evening,
}

impl PickupWindow {
    /// Time the courier arrives.
    #[must_use]
    pub const fn time(self) -> &'static str {
        match self {
            Self::Morning => "09:00 AM",
            Self::Afternoon => "01:00 PM",
            Self::Evening => "05:00 PM",
        }
    }
}

/// A pickup request as submitted by the scheduling form or API.
///
/// Everything arrives as text so HTML forms and JSON bodies share one type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleRequest {
    pub pickup_address: String,
    pub pickup_city: String,
    pub pickup_state: String,
    pub pickup_zip: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_zip: String,
    pub package_type: PackageKind,
    /// Weight in pounds.
    pub weight: String,
    pub dimensions: String,
    /// `YYYY-MM-DD`; blank means today.
    pub pickup_date: String,
    pub pickup_time: PickupWindow,
}

impl ScheduleRequest {
    /// Validate the request and build the draft to insert.
    ///
    /// `today` stamps the `Order Placed` entry and stands in for a blank
    /// pickup date; `placed_at` is its time label.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn into_draft(self, today: NaiveDate, placed_at: &str) -> Result<DeliveryDraft, String> {
        let required = [
            (&self.pickup_city, "Pickup city"),
            (&self.pickup_state, "Pickup state"),
            (&self.delivery_city, "Delivery city"),
            (&self.delivery_state, "Delivery state"),
            (&self.weight, "Weight"),
        ];
        if let Some((_, field)) = required.iter().find(|(value, _)| value.trim().is_empty()) {
            return Err(format!("{field} is required"));
        }

        let weight: f64 = self
            .weight
            .trim()
            .parse()
            .map_err(|_| "Weight must be a number".to_string())?;
        if !weight.is_finite() || weight <= 0.0 {
            return Err("Weight must be greater than zero".to_string());
        }

        let pickup_date = match self.pickup_date.trim() {
            "" => today,
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| "Pickup date must be YYYY-MM-DD".to_string())?,
        };

        let dimensions = match self.dimensions.trim() {
            "" => "Standard".to_string(),
            value => value.to_string(),
        };

        let today_label = format_date(today);
        let from = format!("{}, {}", self.pickup_city.trim(), self.pickup_state.trim());

        Ok(DeliveryDraft {
            package_type: Some(self.package_type.label().to_string()),
            weight: Some(format!("{} lbs", self.weight.trim())),
            dimensions: Some(dimensions),
            to: Some(format!(
                "{}, {}",
                self.delivery_city.trim(),
                self.delivery_state.trim()
            )),
            date: Some(today_label.clone()),
            status: Some(beezetrack_core::DeliveryStatus::Pending),
            updates: Some(vec![DeliveryUpdate {
                status: ORDER_PLACED.to_string(),
                date: today_label,
                time: placed_at.to_string(),
                description: "Your order has been placed and is being processed.".to_string(),
                location: Some(from.clone()),
            }]),
            pickup: Some(PickupSlot {
                date: format_date(pickup_date),
                time: self.pickup_time.time().to_string(),
            }),
            from: Some(from),
            ..DeliveryDraft::default()
        })
    }
}
