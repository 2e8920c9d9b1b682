//! Storage backends.
//!
//! [`DataStore`] hides whether users and deliveries live in process memory
//! (mock mode) or in `PostgreSQL`. Services talk to it and never to a
//! backend directly, except for password hashes which only exist in the
//! database.

pub mod memory;

use sqlx::PgPool;

use beezetrack_core::{DeliveryId, DeliveryStatus, Email, TrackingNumber, UserId};

pub use memory::MockStore;

use crate::db::{DeliveryRepository, RepositoryError, UserRepository};
use crate::models::delivery::{Delivery, DeliveryUpdate, NewDelivery};
use crate::models::user::{NewUser, Profile, User};

/// Backend holding users and deliveries.
#[derive(Clone)]
pub enum DataStore {
    /// Simulated backend.
    Mock(MockStore),
    /// `PostgreSQL` backend.
    Postgres(PgPool),
}

impl DataStore {
    /// Whether this is the simulated backend.
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    /// The connection pool, in database mode.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(pool) => Some(pool),
            Self::Mock(_) => None,
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        match self {
            Self::Mock(store) => store.create_user(new_user).await,
            Self::Postgres(pool) => UserRepository::new(pool).create(new_user).await,
        }
    }

    /// Find a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        match self {
            Self::Mock(store) => Ok(store.user_by_email(email).await),
            Self::Postgres(pool) => UserRepository::new(pool).get_by_email(email).await,
        }
    }

    /// Find a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        match self {
            Self::Mock(store) => Ok(store.user_by_id(id).await),
            Self::Postgres(pool) => UserRepository::new(pool).get_by_id(id).await,
        }
    }

    /// Replace a user's name, email and profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Conflict`.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
        profile: &Profile,
    ) -> Result<User, RepositoryError> {
        match self {
            Self::Mock(store) => store.update_profile(id, name, email, profile).await,
            Self::Postgres(pool) => {
                UserRepository::new(pool)
                    .update_profile(id, name, email, profile)
                    .await
            }
        }
    }

    // =========================================================================
    // Deliveries
    // =========================================================================

    /// Insert a delivery under a freshly generated tracking number.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to persist the delivery.
    pub async fn create_delivery(&self, new: &NewDelivery) -> Result<Delivery, RepositoryError> {
        match self {
            Self::Mock(store) => store.create_delivery(new).await,
            Self::Postgres(pool) => DeliveryRepository::new(pool).create(new).await,
        }
    }

    /// Find a delivery by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delivery_by_id(&self, id: DeliveryId) -> Result<Option<Delivery>, RepositoryError> {
        match self {
            Self::Mock(store) => Ok(store.delivery_by_id(id).await),
            Self::Postgres(pool) => DeliveryRepository::new(pool).get_by_id(id).await,
        }
    }

    /// Find a delivery by tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delivery_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Result<Option<Delivery>, RepositoryError> {
        match self {
            Self::Mock(store) => Ok(store.delivery_by_tracking_number(tracking_number).await),
            Self::Postgres(pool) => {
                DeliveryRepository::new(pool)
                    .get_by_tracking_number(tracking_number)
                    .await
            }
        }
    }

    /// Deliveries owned by `viewer` plus unowned ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn visible_deliveries(&self, viewer: UserId) -> Result<Vec<Delivery>, RepositoryError> {
        match self {
            Self::Mock(store) => Ok(store.visible_deliveries(viewer).await),
            Self::Postgres(pool) => DeliveryRepository::new(pool).list_visible(viewer).await,
        }
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
        match self {
            Self::Mock(store) => Ok(store.visible_statuses(viewer).await),
            Self::Postgres(pool) => DeliveryRepository::new(pool).visible_statuses(viewer).await,
        }
    }

    /// Set a delivery's status and append the timeline entry built by `entry`.
    ///
    /// `entry` sees the delivery as it was before the change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    pub async fn update_status<F>(
        &self,
        id: DeliveryId,
        status: DeliveryStatus,
        entry: F,
    ) -> Result<Delivery, RepositoryError>
    where
        F: FnOnce(&Delivery) -> DeliveryUpdate + Send,
    {
        match self {
            Self::Mock(store) => store.update_status(id, status, entry).await,
            Self::Postgres(pool) => {
                DeliveryRepository::new(pool)
                    .update_status(id, status, entry)
                    .await
            }
        }
    }

    /// Replace a delivery's image URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    pub async fn set_image(&self, id: DeliveryId, image_url: &str) -> Result<(), RepositoryError> {
        match self {
            Self::Mock(store) => store.set_image(id, image_url).await,
            Self::Postgres(pool) => DeliveryRepository::new(pool).set_image(id, image_url).await,
        }
    }
}
