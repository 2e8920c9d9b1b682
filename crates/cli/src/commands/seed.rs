//! Seed the database with the demo deliveries.
//!
//! The demo deliveries are unowned, so every account sees them on its
//! dashboard. Re-running the command skips numbers that already exist.

use chrono::Local;
use tracing::info;

use beezetrack_server::db::{DeliveryRepository, RepositoryError};
use beezetrack_server::models::NewDelivery;
use beezetrack_server::services::deliveries::generator;

use super::connect;

/// Insert the demo deliveries.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails for a
/// reason other than an existing tracking number.
pub async fn demo() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let repo = DeliveryRepository::new(&pool);

    let demo = generator::demo_deliveries(Local::now().date_naive(), &mut rand::rng());
    let mut inserted = 0_usize;
    for delivery in demo {
        let tracking_number = delivery.tracking_number.clone();
        match repo
            .create_with_tracking_number(&NewDelivery::from(delivery), &tracking_number)
            .await
        {
            Ok(_) => {
                inserted += 1;
                info!(%tracking_number, "Inserted demo delivery");
            }
            Err(RepositoryError::Conflict(_)) => {
                info!(%tracking_number, "Demo delivery already present, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(inserted, "Demo seed complete");
    Ok(())
}
