//! Session middleware configuration.
//!
//! Mock mode keeps sessions in memory; database mode stores them in
//! `tower_sessions.session` via tower-sessions-sqlx-store.
//!
//! Expired sessions never outlive their expiry for long: the memory store
//! sweeps them whenever a new session is created, and the binary runs
//! [`ExpiredDeletion::continuously_delete_expired`] against `PostgreSQL`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::BeezeTrackConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bzt_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// How often expired `PostgreSQL` sessions are deleted.
const EXPIRED_SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// In-process session store that drops expired records.
#[derive(Clone, Debug, Default)]
pub struct SessionMemoryStore(Arc<Mutex<HashMap<Id, Record>>>);

impl SessionMemoryStore {
    /// Number of records currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.0.lock().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.0.lock().await.is_empty()
    }
}

fn is_active(record: &Record) -> bool {
    record.expiry_date > OffsetDateTime::now_utc()
}

#[async_trait]
impl SessionStore for SessionMemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut sessions = self.0.lock().await;
        sessions.retain(|_, existing| is_active(existing));
        while sessions.contains_key(&record.id) {
            record.id = Id::default();
        }
        sessions.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.0.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .0
            .lock()
            .await
            .get(session_id)
            .filter(|record| is_active(record))
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.0.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SessionMemoryStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        self.0.lock().await.retain(|_, record| is_active(record));
        Ok(())
    }
}

/// Session layer backed by process memory.
#[must_use]
pub fn memory_session_layer(config: &BeezeTrackConfig) -> SessionManagerLayer<SessionMemoryStore> {
    configure(SessionMemoryStore::default(), config)
}

/// Session layer backed by `PostgreSQL`.
///
/// The sessions table is created by the migrations.
#[must_use]
pub fn postgres_session_layer(
    pool: &PgPool,
    config: &BeezeTrackConfig,
) -> SessionManagerLayer<PostgresStore> {
    configure(PostgresStore::new(pool.clone()), config)
}

/// Spawn the background task that deletes expired `PostgreSQL` sessions.
pub fn spawn_expired_session_cleanup(pool: &PgPool) -> tokio::task::JoinHandle<()> {
    let store = PostgresStore::new(pool.clone());
    tokio::spawn(async move {
        if let Err(e) = store.continuously_delete_expired(EXPIRED_SWEEP_INTERVAL).await {
            tracing::error!(error = %e, "Expired session cleanup stopped");
        }
    })
}

fn configure<S: SessionStore + Clone>(
    store: S,
    config: &BeezeTrackConfig,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
