//! Delivery repository for database operations.
//!
//! Timeline entries live in `delivery_updates` and are loaded alongside each
//! delivery, ordered by `position`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use beezetrack_core::{DeliveryId, DeliveryStatus, TrackingNumber, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::delivery::{Delivery, DeliveryUpdate, NewDelivery, PickupSlot};

/// How many fresh tracking numbers to try before giving up.
const TRACKING_NUMBER_ATTEMPTS: usize = 5;

const DELIVERY_COLUMNS: &str = "id, tracking_number, package_type, weight, dimensions, \
                                from_location, to_location, date_label, status, image_url, \
                                carrier, estimated_delivery, pickup_date, pickup_time, owner_id, \
                                created_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` delivery queries.
#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    id: i32,
    tracking_number: String,
    package_type: String,
    weight: String,
    dimensions: String,
    from_location: String,
    to_location: String,
    date_label: String,
    status: DeliveryStatus,
    image_url: Option<String>,
    carrier: Option<String>,
    estimated_delivery: Option<String>,
    pickup_date: Option<String>,
    pickup_time: Option<String>,
    owner_id: Option<i32>,
    created_at: DateTime<Utc>,
}

impl DeliveryRow {
    fn into_delivery(self, updates: Vec<DeliveryUpdate>) -> Result<Delivery, RepositoryError> {
        let tracking_number = TrackingNumber::parse(&self.tracking_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid tracking number in database: {e}"))
        })?;

        let pickup = match (self.pickup_date, self.pickup_time) {
            (Some(date), Some(time)) => Some(PickupSlot { date, time }),
            _ => None,
        };

        Ok(Delivery {
            id: DeliveryId::new(self.id),
            tracking_number,
            package_type: self.package_type,
            weight: self.weight,
            dimensions: self.dimensions,
            from: self.from_location,
            to: self.to_location,
            date: self.date_label,
            status: self.status,
            updates,
            image_url: self.image_url,
            carrier: self.carrier,
            estimated_delivery: self.estimated_delivery,
            pickup,
            owner_id: self.owner_id.map(UserId::new),
            created_at: self.created_at,
        })
    }
}

/// Internal row type for timeline entries.
#[derive(Debug, sqlx::FromRow)]
struct UpdateRow {
    delivery_id: i32,
    status: String,
    date_label: String,
    time_label: String,
    description: String,
    location: Option<String>,
}

impl From<UpdateRow> for DeliveryUpdate {
    fn from(row: UpdateRow) -> Self {
        Self {
            status: row.status,
            date: row.date_label,
            time: row.time_label,
            description: row.description,
            location: row.location,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for delivery database operations.
pub struct DeliveryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DeliveryRepository<'a> {
    /// Create a new delivery repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a delivery and its timeline under a freshly generated tracking number.
    ///
    /// A tracking number collision rolls the transaction back and retries
    /// with a new number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if no unique tracking number was found.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new), fields(from = %new.from, to = %new.to))]
    pub async fn create(&self, new: &NewDelivery) -> Result<Delivery, RepositoryError> {
        for attempt in 1..=TRACKING_NUMBER_ATTEMPTS {
            let tracking_number = TrackingNumber::generate(&mut rand::rng());
            match self.try_create(new, &tracking_number).await {
                Err(RepositoryError::Conflict(_)) => {
                    debug!(attempt, %tracking_number, "Tracking number collision, retrying");
                }
                other => return other,
            }
        }
        Err(RepositoryError::Conflict(
            "could not allocate a unique tracking number".to_string(),
        ))
    }

    /// Insert a delivery under a tracking number chosen by the caller.
    ///
    /// Used to seed the demo deliveries with their well-known numbers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the tracking number is taken.
    pub async fn create_with_tracking_number(
        &self,
        new: &NewDelivery,
        tracking_number: &TrackingNumber,
    ) -> Result<Delivery, RepositoryError> {
        self.try_create(new, tracking_number).await
    }

    async fn try_create(
        &self,
        new: &NewDelivery,
        tracking_number: &TrackingNumber,
    ) -> Result<Delivery, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            r"
            INSERT INTO deliveries (tracking_number, package_type, weight, dimensions,
                                    from_location, to_location, date_label, status, image_url,
                                    carrier, estimated_delivery, pickup_date, pickup_time,
                                    owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {DELIVERY_COLUMNS}
            "
        ))
        .bind(tracking_number.as_str())
        .bind(&new.package_type)
        .bind(&new.weight)
        .bind(&new.dimensions)
        .bind(&new.from)
        .bind(&new.to)
        .bind(&new.date)
        .bind(new.status)
        .bind(new.image_url.as_deref())
        .bind(new.carrier.as_deref())
        .bind(new.estimated_delivery.as_deref())
        .bind(new.pickup.as_ref().map(|p| p.date.as_str()))
        .bind(new.pickup.as_ref().map(|p| p.time.as_str()))
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "tracking number"))?;

        let delivery_id = DeliveryId::new(row.id);
        for (position, update) in new.updates.iter().enumerate() {
            insert_update(&mut tx, delivery_id, position, update).await?;
        }

        tx.commit().await?;

        row.into_delivery(new.updates.clone())
    }

    /// Get a delivery by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: DeliveryId) -> Result<Option<Delivery>, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let updates = self.updates_for(&[row.id]).await?.remove(&row.id);
                row.into_delivery(updates.unwrap_or_default()).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Get a delivery by tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<Delivery>, RepositoryError> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE tracking_number = $1"
        ))
        .bind(tracking_number.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let updates = self.updates_for(&[row.id]).await?.remove(&row.id);
                row.into_delivery(updates.unwrap_or_default()).map(Some)
            }
            None => Ok(None),
        }
    }

    /// List deliveries owned by `viewer` plus unowned demo deliveries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_visible(&self, viewer: UserId) -> Result<Vec<Delivery>, RepositoryError> {
        let rows = sqlx::query_as::<_, DeliveryRow>(&format!(
            r"
            SELECT {DELIVERY_COLUMNS} FROM deliveries
            WHERE owner_id IS NULL OR owner_id = $1
            ORDER BY created_at, id
            "
        ))
        .bind(viewer)
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut updates = self.updates_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let timeline = updates.remove(&row.id).unwrap_or_default();
                row.into_delivery(timeline)
            })
            .collect()
    }

    /// Statuses of the deliveries visible to `viewer`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn visible_statuses(
        &self,
        viewer: UserId,
    ) -> Result<Vec<DeliveryStatus>, RepositoryError> {
        let rows: Vec<(DeliveryStatus,)> = sqlx::query_as(
            "SELECT status FROM deliveries WHERE owner_id IS NULL OR owner_id = $1",
        )
        .bind(viewer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(status,)| status).collect())
    }

    /// Set a delivery's status and append the timeline entry built by `entry`.
    ///
    /// The row is locked for the duration so concurrent updates append in order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    #[instrument(skip(self, entry))]
    pub async fn update_status<F>(
        &self,
        id: DeliveryId,
        status: DeliveryStatus,
        entry: F,
    ) -> Result<Delivery, RepositoryError>
    where
        F: FnOnce(&Delivery) -> DeliveryUpdate + Send,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let timeline: Vec<DeliveryUpdate> = sqlx::query_as::<_, UpdateRow>(
            r"
            SELECT delivery_id, status, date_label, time_label, description, location
            FROM delivery_updates
            WHERE delivery_id = $1
            ORDER BY position
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(DeliveryUpdate::from)
        .collect();

        let mut delivery = row.into_delivery(timeline)?;
        let update = entry(&delivery);

        sqlx::query("UPDATE deliveries SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *tx)
            .await?;
        insert_update(&mut tx, id, delivery.updates.len(), &update).await?;

        tx.commit().await?;

        delivery.status = status;
        delivery.updates.push(update);
        Ok(delivery)
    }

    /// Replace a delivery's image URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    pub async fn set_image(&self, id: DeliveryId, image_url: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE deliveries SET image_url = $2 WHERE id = $1")
            .bind(id)
            .bind(image_url)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Load the timelines of several deliveries, keyed by delivery ID.
    async fn updates_for(
        &self,
        ids: &[i32],
    ) -> Result<HashMap<i32, Vec<DeliveryUpdate>>, RepositoryError> {
        let rows = sqlx::query_as::<_, UpdateRow>(
            r"
            SELECT delivery_id, status, date_label, time_label, description, location
            FROM delivery_updates
            WHERE delivery_id = ANY($1)
            ORDER BY delivery_id, position
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<DeliveryUpdate>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.delivery_id)
                .or_default()
                .push(DeliveryUpdate::from(row));
        }
        Ok(grouped)
    }
}

async fn insert_update(
    conn: &mut PgConnection,
    delivery_id: DeliveryId,
    position: usize,
    update: &DeliveryUpdate,
) -> Result<(), RepositoryError> {
    let position = i32::try_from(position)
        .map_err(|_| RepositoryError::DataCorruption("timeline too long".to_string()))?;

    sqlx::query(
        r"
        INSERT INTO delivery_updates (delivery_id, position, status, date_label, time_label,
                                      description, location)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(delivery_id)
    .bind(position)
    .bind(&update.status)
    .bind(&update.date)
    .bind(&update.time)
    .bind(&update.description)
    .bind(update.location.as_deref())
    .execute(conn)
    .await?;

    Ok(())
}
