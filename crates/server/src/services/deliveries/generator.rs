//! Mock delivery generator.
//!
//! Fills in whatever a [`DeliveryDraft`] leaves unset with plausible values
//! and builds the canned timeline shown for each status. Also produces the
//! demo deliveries a fresh mock store starts with.

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use beezetrack_core::{DeliveryId, DeliveryStatus, TrackingNumber, UserId};

use crate::models::delivery::{Delivery, DeliveryDraft, DeliveryUpdate, NewDelivery};

pub const CITIES: [&str; 20] = [
    "New York, NY",
    "Los Angeles, CA",
    "Chicago, IL",
    "Houston, TX",
    "Phoenix, AZ",
    "Philadelphia, PA",
    "San Antonio, TX",
    "San Diego, CA",
    "Dallas, TX",
    "San Jose, CA",
    "Austin, TX",
    "Jacksonville, FL",
    "Fort Worth, TX",
    "Columbus, OH",
    "Charlotte, NC",
    "San Francisco, CA",
    "Indianapolis, IN",
    "Seattle, WA",
    "Denver, CO",
    "Boston, MA",
];

pub const PACKAGE_TYPES: [&str; 12] = [
    "Standard Box",
    "Large Box",
    "Small Package",
    "Envelope",
    "Tube",
    "Pallet",
    "Fragile Items",
    "Electronics",
    "Clothing",
    "Documents",
    "Books",
    "Perishable Goods",
];

pub const DIMENSIONS: [&str; 8] = [
    "20cm x 15cm x 10cm",
    "30cm x 25cm x 20cm",
    "10cm x 8cm x 5cm",
    "40cm x 35cm x 30cm",
    "25cm x 20cm x 15cm",
    "100cm x 80cm x 60cm",
    "15cm x 12cm x 8cm",
    "50cm x 40cm x 35cm",
];

pub const WEIGHTS: [&str; 11] = [
    "0.5kg", "1kg", "2kg", "3kg", "5kg", "7kg", "10kg", "15kg", "20kg", "25kg", "0.2kg",
];

pub const CARRIERS: [&str; 4] = ["BeezeExpress", "FastTrack", "GlobalShip", "QuickDeliver"];

/// Days between the generated start date and today.
const DAYS_IN_NETWORK: u64 = 3;
/// Days between the start date and the estimated delivery.
const DELIVERY_WINDOW: u64 = 3;

/// Tracking numbers and statuses of the demo deliveries.
const DEMO_DELIVERIES: [(&str, DeliveryStatus); 4] = [
    ("BZ123456", DeliveryStatus::Pending),
    ("BZ789012", DeliveryStatus::Pending),
    ("BZ345678", DeliveryStatus::InTransit),
    ("BZ901234", DeliveryStatus::Delivered),
];

/// Format a date the way timelines show it, e.g. `March 4, 2025`.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Format a time the way timelines show it, e.g. `2:30 PM`.
#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

fn pick<R: Rng>(rng: &mut R, items: &[&str]) -> String {
    items.choose(rng).copied().unwrap_or_default().to_string()
}

/// Turn a draft into a complete delivery, generating every missing field.
///
/// The destination is re-rolled until it differs from the origin. Supplied
/// updates are kept as-is; otherwise the canned timeline for the status is
/// used.
pub fn fill_draft<R: Rng>(
    draft: DeliveryDraft,
    owner_id: Option<UserId>,
    today: NaiveDate,
    rng: &mut R,
) -> NewDelivery {
    let from = draft.from.unwrap_or_else(|| pick(rng, &CITIES));
    let mut to = draft.to.unwrap_or_else(|| pick(rng, &CITIES));
    while to == from {
        to = pick(rng, &CITIES);
    }

    let start = today - Days::new(DAYS_IN_NETWORK);
    let estimated = start + Days::new(DELIVERY_WINDOW);
    let status = draft.status.unwrap_or_default();

    let updates = match draft.updates {
        Some(updates) if !updates.is_empty() => updates,
        _ => timeline(status, &from, &to, start, estimated),
    };

    NewDelivery {
        package_type: draft
            .package_type
            .unwrap_or_else(|| pick(rng, &PACKAGE_TYPES)),
        weight: draft.weight.unwrap_or_else(|| pick(rng, &WEIGHTS)),
        dimensions: draft.dimensions.unwrap_or_else(|| pick(rng, &DIMENSIONS)),
        date: draft.date.unwrap_or_else(|| format_date(start)),
        carrier: Some(draft.carrier.unwrap_or_else(|| pick(rng, &CARRIERS))),
        estimated_delivery: Some(
            draft
                .estimated_delivery
                .unwrap_or_else(|| format_date(estimated)),
        ),
        from,
        to,
        status,
        updates,
        image_url: draft.image_url,
        pickup: draft.pickup,
        owner_id,
    }
}

/// The canned timeline for a delivery in `status`.
///
/// Every delivery starts with a pickup entry; in-transit deliveries add the
/// pickup and sorting scans, delivered ones the final two.
#[must_use]
pub fn timeline(
    status: DeliveryStatus,
    from: &str,
    to: &str,
    start: NaiveDate,
    estimated: NaiveDate,
) -> Vec<DeliveryUpdate> {
    let entry = |status: DeliveryStatus, date: NaiveDate, time: &str, description: &str, location: String| {
        DeliveryUpdate {
            status: status.as_str().to_string(),
            date: format_date(date),
            time: time.to_string(),
            description: description.to_string(),
            location: Some(location),
        }
    };

    let mut updates = vec![entry(
        DeliveryStatus::Pending,
        start,
        "9:00 AM",
        "Your package has been scheduled for pickup.",
        from.to_string(),
    )];

    if matches!(status, DeliveryStatus::InTransit | DeliveryStatus::Delivered) {
        let transit = start + Days::new(1);
        let city = from.split(',').next().unwrap_or(from);
        updates.push(entry(
            DeliveryStatus::InTransit,
            transit,
            "2:30 PM",
            "Your package has been picked up and is on its way.",
            from.to_string(),
        ));
        updates.push(entry(
            DeliveryStatus::InTransit,
            transit,
            "7:45 PM",
            "Your package has arrived at the sorting facility.",
            format!("{city} Sorting Center"),
        ));
    }

    if status == DeliveryStatus::Delivered {
        updates.push(entry(
            DeliveryStatus::InTransit,
            estimated,
            "8:30 AM",
            "Your package is out for delivery.",
            to.to_string(),
        ));
        updates.push(entry(
            DeliveryStatus::Delivered,
            estimated,
            "2:15 PM",
            "Your package has been delivered.",
            to.to_string(),
        ));
    }

    updates
}

/// Fabricate a delivery for a tracking number nobody has stored.
///
/// The result is never persisted and carries ID 0.
pub fn placeholder<R: Rng>(
    tracking_number: TrackingNumber,
    today: NaiveDate,
    rng: &mut R,
) -> Delivery {
    fill_draft(DeliveryDraft::default(), None, today, rng).into_delivery(
        DeliveryId::new(0),
        tracking_number,
        Utc::now(),
    )
}

/// The unowned deliveries a fresh mock store starts with.
pub fn demo_deliveries<R: Rng>(today: NaiveDate, rng: &mut R) -> Vec<Delivery> {
    let now = Utc::now();
    (1000..)
        .zip(DEMO_DELIVERIES)
        .filter_map(|(id, (tracking_number, status))| {
            let tracking_number = TrackingNumber::parse(tracking_number).ok()?;
            let draft = DeliveryDraft {
                status: Some(status),
                ..DeliveryDraft::default()
            };
            Some(fill_draft(draft, None, today, rng).into_delivery(
                DeliveryId::new(id),
                tracking_number,
                now,
            ))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_format_date_and_time() {
        assert_eq!(format_date(today()), "March 10, 2025");
        let time = NaiveTime::from_hms_opt(14, 5, 0).unwrap();
        assert_eq!(format_time(time), "2:05 PM");
    }

    #[test]
    fn test_fill_empty_draft() {
        let mut rng = rand::rng();
        for _ in 0..25 {
            let new = fill_draft(DeliveryDraft::default(), None, today(), &mut rng);
            assert_ne!(new.from, new.to);
            assert!(CITIES.contains(&new.from.as_str()));
            assert!(CARRIERS.contains(&new.carrier.as_deref().unwrap()));
            assert_eq!(new.status, DeliveryStatus::Pending);
            assert_eq!(new.date, "March 7, 2025");
            assert_eq!(new.estimated_delivery.as_deref(), Some("March 10, 2025"));
            assert_eq!(new.updates.len(), 1);
        }
    }

    #[test]
    fn test_fill_keeps_supplied_fields() {
        let draft = DeliveryDraft {
            from: Some("Boston, MA".to_string()),
            to: Some("Seattle, WA".to_string()),
            weight: Some("4 lbs".to_string()),
            updates: Some(vec![DeliveryUpdate {
                status: "Order Placed".to_string(),
                date: "March 10, 2025".to_string(),
                time: "10:00 AM".to_string(),
                description: "placed".to_string(),
                location: None,
            }]),
            ..DeliveryDraft::default()
        };
        let new = fill_draft(draft, Some(UserId::new(3)), today(), &mut rand::rng());

        assert_eq!(new.from, "Boston, MA");
        assert_eq!(new.to, "Seattle, WA");
        assert_eq!(new.weight, "4 lbs");
        assert_eq!(new.updates.len(), 1);
        assert_eq!(new.updates[0].status, "Order Placed");
        assert_eq!(new.owner_id, Some(UserId::new(3)));
    }

    #[test]
    fn test_same_origin_and_destination_is_rerolled() {
        let draft = DeliveryDraft {
            from: Some("Austin, TX".to_string()),
            to: Some("Austin, TX".to_string()),
            ..DeliveryDraft::default()
        };
        let new = fill_draft(draft, None, today(), &mut rand::rng());
        assert_eq!(new.from, "Austin, TX");
        assert_ne!(new.to, "Austin, TX");
    }

    #[test]
    fn test_timeline_per_status() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let eta = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let count = |status| timeline(status, "Chicago, IL", "Denver, CO", start, eta).len();

        assert_eq!(count(DeliveryStatus::Pending), 1);
        assert_eq!(count(DeliveryStatus::Cancelled), 1);
        assert_eq!(count(DeliveryStatus::InTransit), 3);
        assert_eq!(count(DeliveryStatus::Delivered), 5);

        let delivered = timeline(DeliveryStatus::Delivered, "Chicago, IL", "Denver, CO", start, eta);
        assert_eq!(delivered[2].location.as_deref(), Some("Chicago Sorting Center"));
        assert_eq!(delivered[4].status, "Delivered");
        assert_eq!(delivered[4].date, "March 10, 2025");
        assert_eq!(delivered[4].location.as_deref(), Some("Denver, CO"));
    }

    #[test]
    fn test_placeholder_keeps_tracking_number() {
        let tn = TrackingNumber::parse("UNKNOWN123").unwrap();
        let delivery = placeholder(tn.clone(), today(), &mut rand::rng());
        assert_eq!(delivery.tracking_number, tn);
        assert_eq!(delivery.id.as_i32(), 0);
        assert_eq!(delivery.status, DeliveryStatus::Pending);
    }

    #[test]
    fn test_demo_deliveries() {
        let demo = demo_deliveries(today(), &mut rand::rng());
        let numbers: Vec<_> = demo.iter().map(|d| d.tracking_number.as_str()).collect();
        assert_eq!(numbers, ["BZ123456", "BZ789012", "BZ345678", "BZ901234"]);
        assert_eq!(demo[0].id.as_i32(), 1000);
        assert_eq!(demo[3].status, DeliveryStatus::Delivered);
        assert!(demo.iter().all(|d| d.owner_id.is_none()));
    }
}
