//! Dashboard statistics derived from a set of deliveries.
//!
//! Statistics are never stored. They are recomputed from the current
//! delivery statuses every time they are requested, so they cannot drift from
//! the underlying data.

use serde::{Deserialize, Serialize};

use super::status::DeliveryStatus;

/// On-time rate reported once anything has been delivered.
pub const DEMO_ON_TIME_RATE: u8 = 95;
/// Average delivery time reported once anything has been delivered.
pub const DEMO_AVERAGE_DELIVERY_TIME: &str = "2.5 days";
/// Satisfaction score reported once anything has been delivered.
pub const DEMO_CUSTOMER_SATISFACTION: f64 = 4.7;

/// Snapshot of delivery counts and service-level figures.
///
/// `on_time_delivery_rate`, `average_delivery_time` and
/// `customer_satisfaction` are fixed demo figures, not measurements: they
/// switch from zero to their constants as soon as one delivery is Delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStatistics {
    pub total_deliveries: usize,
    pub pending_deliveries: usize,
    pub in_transit_deliveries: usize,
    pub delivered_deliveries: usize,
    pub on_time_delivery_rate: u8,
    pub average_delivery_time: String,
    pub customer_satisfaction: f64,
}

impl Default for DeliveryStatistics {
    fn default() -> Self {
        Self {
            total_deliveries: 0,
            pending_deliveries: 0,
            in_transit_deliveries: 0,
            delivered_deliveries: 0,
            on_time_delivery_rate: 0,
            average_delivery_time: "0 days".to_string(),
            customer_satisfaction: 0.0,
        }
    }
}

impl DeliveryStatistics {
    /// Fold a sequence of delivery statuses into statistics.
    ///
    /// Cancelled deliveries count towards the total only.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = DeliveryStatus>,
    {
        let mut stats = statuses
            .into_iter()
            .fold(Self::default(), |mut acc, status| {
                acc.total_deliveries += 1;
                match status {
                    DeliveryStatus::Pending => acc.pending_deliveries += 1,
                    DeliveryStatus::InTransit => acc.in_transit_deliveries += 1,
                    DeliveryStatus::Delivered => acc.delivered_deliveries += 1,
                    DeliveryStatus::Cancelled => {}
                }
                acc
            });

        if stats.delivered_deliveries > 0 {
            stats.on_time_delivery_rate = DEMO_ON_TIME_RATE;
            DEMO_AVERAGE_DELIVERY_TIME.clone_into(&mut stats.average_delivery_time);
            stats.customer_satisfaction = DEMO_CUSTOMER_SATISFACTION;
        }

        stats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use DeliveryStatus::{Cancelled, Delivered, InTransit, Pending};

    #[test]
    fn test_empty_set_is_default() {
        let stats = DeliveryStatistics::from_statuses(Vec::<DeliveryStatus>::new());
        assert_eq!(stats, DeliveryStatistics::default());
        assert_eq!(stats.average_delivery_time, "0 days");
    }

    #[test]
    fn test_counts_by_status() {
        let stats =
            DeliveryStatistics::from_statuses([Pending, Pending, InTransit, Delivered, Cancelled]);
        assert_eq!(stats.total_deliveries, 5);
        assert_eq!(stats.pending_deliveries, 2);
        assert_eq!(stats.in_transit_deliveries, 1);
        assert_eq!(stats.delivered_deliveries, 1);
    }

    #[test]
    fn test_buckets_never_exceed_total() {
        let sets: [&[DeliveryStatus]; 4] = [
            &[],
            &[Cancelled, Cancelled],
            &[Pending, InTransit, Delivered],
            &[Delivered, Cancelled, Pending, Cancelled, InTransit, InTransit],
        ];
        for set in sets {
            let stats = DeliveryStatistics::from_statuses(set.iter().copied());
            assert!(
                stats.pending_deliveries + stats.in_transit_deliveries + stats.delivered_deliveries
                    <= stats.total_deliveries
            );
            assert_eq!(stats.total_deliveries, set.len());
        }
    }

    #[test]
    fn test_demo_figures_require_a_delivered_parcel() {
        let stats = DeliveryStatistics::from_statuses([Pending, InTransit]);
        assert_eq!(stats.on_time_delivery_rate, 0);
        assert!(stats.customer_satisfaction.abs() < f64::EPSILON);

        let stats = DeliveryStatistics::from_statuses([Pending, Delivered]);
        assert_eq!(stats.on_time_delivery_rate, 95);
        assert_eq!(stats.average_delivery_time, "2.5 days");
        assert!((stats.customer_satisfaction - 4.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(DeliveryStatistics::from_statuses([InTransit])).unwrap();
        assert_eq!(json["totalDeliveries"], 1);
        assert_eq!(json["inTransitDeliveries"], 1);
        assert_eq!(json["onTimeDeliveryRate"], 0);
    }
}
