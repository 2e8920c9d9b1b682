//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Local;
use sqlx::PgPool;

use crate::config::{BeezeTrackConfig, DataMode};
use crate::db::{self, RepositoryError};
use crate::services::deliveries::generator;
use crate::services::{AuthService, DeliveryService, UploadStore};
use crate::store::{DataStore, MockStore};

/// Error building application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to open mock store: {0}")]
    MockStore(#[from] RepositoryError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the data store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BeezeTrackConfig,
    store: DataStore,
    uploads: UploadStore,
}

impl AppState {
    /// Build the state for `config`.
    ///
    /// Mock mode opens (or seeds) the in-memory store; database mode
    /// connects the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the mock snapshot
    /// is unreadable.
    pub async fn from_config(config: BeezeTrackConfig) -> Result<Self, StateError> {
        let store = match &config.data {
            DataMode::Mock { snapshot } => {
                let seed = generator::demo_deliveries(Local::now().date_naive(), &mut rand::rng());
                DataStore::Mock(MockStore::open(snapshot.clone(), seed).await?)
            }
            DataMode::Database { url } => DataStore::Postgres(db::create_pool(url).await?),
        };

        Ok(Self::new(config, store))
    }

    /// Create state around an existing store.
    #[must_use]
    pub fn new(config: BeezeTrackConfig, store: DataStore) -> Self {
        let uploads = UploadStore::new(&config.uploads);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                uploads,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &BeezeTrackConfig {
        &self.inner.config
    }

    /// Get a reference to the data store.
    #[must_use]
    pub fn store(&self) -> &DataStore {
        &self.inner.store
    }

    /// Get the database connection pool, in database mode.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.store.pool()
    }

    /// Get a reference to the upload store.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Authentication service over this state's store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.store)
    }

    /// Delivery service over this state's store.
    #[must_use]
    pub fn deliveries(&self) -> DeliveryService<'_> {
        DeliveryService::new(&self.inner.store)
    }
}
