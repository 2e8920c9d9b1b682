//! In-process store used in mock mode.
//!
//! All state sits behind a single `RwLock`. Mutations hold the write lock
//! while the snapshot file is rewritten, so two requests can never persist
//! interleaved views of the data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use beezetrack_core::{DeliveryId, DeliveryStatus, Email, TrackingNumber, UserId};

use crate::db::RepositoryError;
use crate::models::delivery::{Delivery, DeliveryUpdate, NewDelivery};
use crate::models::user::{NewUser, Profile, User};

/// First ID handed out when the store is empty.
const FIRST_ID: i32 = 1000;

/// On-disk layout of the mock snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MockData {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    deliveries: Vec<Delivery>,
}

impl MockData {
    fn next_user_id(&self) -> UserId {
        UserId::new(
            self.users
                .iter()
                .map(|u| u.id.as_i32() + 1)
                .max()
                .unwrap_or(FIRST_ID),
        )
    }

    fn next_delivery_id(&self) -> DeliveryId {
        DeliveryId::new(
            self.deliveries
                .iter()
                .map(|d| d.id.as_i32() + 1)
                .max()
                .unwrap_or(FIRST_ID),
        )
    }

    fn tracking_number_taken(&self, tracking_number: &TrackingNumber) -> bool {
        self.deliveries
            .iter()
            .any(|d| &d.tracking_number == tracking_number)
    }

    fn email_taken(&self, email: &Email, except: Option<UserId>) -> bool {
        self.users
            .iter()
            .any(|u| &u.email == email && Some(u.id) != except)
    }
}

/// Mock-mode store for users and deliveries.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct MockStore {
    data: Arc<RwLock<MockData>>,
    snapshot: Option<PathBuf>,
}

impl MockStore {
    /// Open the store.
    ///
    /// Loads `snapshot` when the file exists, otherwise starts from `seed`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Snapshot` if an existing snapshot cannot be
    /// read or parsed.
    pub async fn open(
        snapshot: Option<PathBuf>,
        seed: Vec<Delivery>,
    ) -> Result<Self, RepositoryError> {
        let data = match &snapshot {
            Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => {
                let data = read_snapshot(path).await?;
                info!(
                    path = %path.display(),
                    users = data.users.len(),
                    deliveries = data.deliveries.len(),
                    "Loaded mock snapshot"
                );
                data
            }
            _ => MockData {
                users: Vec::new(),
                deliveries: seed,
            },
        };

        Ok(Self {
            data: Arc::new(RwLock::new(data)),
            snapshot,
        })
    }

    /// A store without persistence, seeded with `seed`.
    #[must_use]
    pub fn ephemeral(seed: Vec<Delivery>) -> Self {
        Self {
            data: Arc::new(RwLock::new(MockData {
                users: Vec::new(),
                deliveries: seed,
            })),
            snapshot: None,
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
        self.commit(|data| {
            if data.email_taken(&new_user.email, None) {
                return Err(RepositoryError::Conflict("email already exists".to_string()));
            }

            let now = Utc::now();
            let user = User {
                id: data.next_user_id(),
                name: new_user.name.clone(),
                email: new_user.email.clone(),
                profile: new_user.profile.clone(),
                created_at: now,
                updated_at: now,
            };
            data.users.push(user.clone());
            Ok(user)
        })
        .await
    }

    /// Find a user by email.
    pub async fn user_by_email(&self, email: &Email) -> Option<User> {
        let data = self.data.read().await;
        data.users.iter().find(|u| &u.email == email).cloned()
    }

    /// Find a user by ID.
    pub async fn user_by_id(&self, id: UserId) -> Option<User> {
        let data = self.data.read().await;
        data.users.iter().find(|u| u.id == id).cloned()
    }

    /// Replace a user's name, email and profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown user and
    /// `RepositoryError::Conflict` if another account owns `email`.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        email: &Email,
        profile: &Profile,
    ) -> Result<User, RepositoryError> {
        self.commit(|data| {
            if data.email_taken(email, Some(id)) {
                return Err(RepositoryError::Conflict("email already exists".to_string()));
            }

            let user = data
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(RepositoryError::NotFound)?;
            name.clone_into(&mut user.name);
            user.email = email.clone();
            user.profile = profile.clone();
            user.updated_at = Utc::now();
            Ok(user.clone())
        })
        .await
    }

    // =========================================================================
    // Deliveries
    // =========================================================================

    /// Insert a delivery under a fresh, unused tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Snapshot` if persisting fails.
    #[instrument(skip(self, new), fields(from = %new.from, to = %new.to))]
    pub async fn create_delivery(&self, new: &NewDelivery) -> Result<Delivery, RepositoryError> {
        self.commit(|data| {
            let tracking_number = {
                let mut rng = rand::rng();
                loop {
                    let candidate = TrackingNumber::generate(&mut rng);
                    if !data.tracking_number_taken(&candidate) {
                        break candidate;
                    }
                    debug!(%candidate, "Tracking number collision, retrying");
                }
            };

            let delivery =
                new.clone()
                    .into_delivery(data.next_delivery_id(), tracking_number, Utc::now());
            data.deliveries.push(delivery.clone());
            Ok(delivery)
        })
        .await
    }

    /// Find a delivery by ID.
    pub async fn delivery_by_id(&self, id: DeliveryId) -> Option<Delivery> {
        let data = self.data.read().await;
        data.deliveries.iter().find(|d| d.id == id).cloned()
    }

    /// Find a delivery by tracking number.
    pub async fn delivery_by_tracking_number(
        &self,
        tracking_number: &TrackingNumber,
    ) -> Option<Delivery> {
        let data = self.data.read().await;
        data.deliveries
            .iter()
            .find(|d| &d.tracking_number == tracking_number)
            .cloned()
    }

    /// Deliveries visible to `viewer`, in insertion order.
    pub async fn visible_deliveries(&self, viewer: UserId) -> Vec<Delivery> {
        let data = self.data.read().await;
        data.deliveries
            .iter()
            .filter(|d| d.is_visible_to(viewer))
            .cloned()
            .collect()
    }

    /// Statuses of the deliveries visible to `viewer`.
    pub async fn visible_statuses(&self, viewer: UserId) -> Vec<DeliveryStatus> {
        let data = self.data.read().await;
        data.deliveries
            .iter()
            .filter(|d| d.is_visible_to(viewer))
            .map(|d| d.status)
            .collect()
    }

    /// Set a delivery's status and append the timeline entry built by `entry`.
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
        self.commit(|data| {
            let delivery = data
                .deliveries
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or(RepositoryError::NotFound)?;

            let update = entry(&*delivery);
            delivery.status = status;
            delivery.updates.push(update);
            Ok(delivery.clone())
        })
        .await
    }

    /// Replace a delivery's image URL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the delivery does not exist.
    pub async fn set_image(&self, id: DeliveryId, image_url: &str) -> Result<(), RepositoryError> {
        self.commit(|data| {
            let delivery = data
                .deliveries
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or(RepositoryError::NotFound)?;
            delivery.image_url = Some(image_url.to_string());
            Ok(())
        })
        .await
    }

    /// Apply `change` under the write lock.
    ///
    /// With a snapshot configured the change is made to a copy, which only
    /// replaces the live data once it has been written, so a failed write
    /// leaves memory and snapshot in agreement.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut MockData) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut data = self.data.write().await;
        if self.snapshot.is_none() {
            return change(&mut *data);
        }

        let mut candidate = data.clone();
        let value = change(&mut candidate)?;
        self.persist(&candidate).await?;
        *data = candidate;
        Ok(value)
    }

    /// Rewrite the snapshot file, if one is configured.
    ///
    /// Writes to a sibling temp file and renames it into place.
    async fn persist(&self, data: &MockData) -> Result<(), RepositoryError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(data)
            .map_err(|e| RepositoryError::Snapshot(format!("serialize: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Snapshot(format!("{}: {e}", parent.display())))?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RepositoryError::Snapshot(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| RepositoryError::Snapshot(format!("{}: {e}", path.display())))
    }
}

async fn read_snapshot(path: &Path) -> Result<MockData, RepositoryError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RepositoryError::Snapshot(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| RepositoryError::Snapshot(format!("{}: {e}", path.display())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_delivery(owner_id: Option<UserId>) -> NewDelivery {
        NewDelivery {
            package_type: "Books".to_string(),
            weight: "2kg".to_string(),
            dimensions: "20cm x 15cm x 10cm".to_string(),
            from: "Austin, TX".to_string(),
            to: "Denver, CO".to_string(),
            date: "June 1, 2025".to_string(),
            status: DeliveryStatus::Pending,
            updates: Vec::new(),
            image_url: None,
            carrier: None,
            estimated_delivery: None,
            pickup: None,
            owner_id,
        }
    }

    fn new_user(email: &str) -> NewUser {
        let email = Email::parse(email).unwrap();
        NewUser {
            name: email.display_name(),
            email,
            profile: Profile::default(),
            password_hash: None,
        }
    }

    #[tokio::test]
    async fn test_ids_start_at_first_id_and_increase() {
        let store = MockStore::ephemeral(Vec::new());
        let a = store.create_delivery(&new_delivery(None)).await.unwrap();
        let b = store.create_delivery(&new_delivery(None)).await.unwrap();

        assert_eq!(a.id.as_i32(), FIRST_ID);
        assert_eq!(b.id.as_i32(), FIRST_ID + 1);
        assert_ne!(a.tracking_number, b.tracking_number);
        assert!(a.tracking_number.is_standard());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MockStore::ephemeral(Vec::new());
        store.create_user(&new_user("sam@example.com")).await.unwrap();

        let err = store
            .create_user(&new_user("SAM@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let store = MockStore::ephemeral(Vec::new());
        store.create_user(&new_user("a@example.com")).await.unwrap();
        let b = store.create_user(&new_user("b@example.com")).await.unwrap();

        let taken = Email::parse("a@example.com").unwrap();
        let err = store
            .update_profile(b.id, "B", &taken, &Profile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        // Keeping your own email is fine.
        let updated = store
            .update_profile(b.id, "Bea", &b.email, &Profile::default())
            .await
            .unwrap();
        assert_eq!(updated.name, "Bea");
    }

    #[tokio::test]
    async fn test_visibility_filters_other_owners() {
        let store = MockStore::ephemeral(Vec::new());
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        store.create_delivery(&new_delivery(None)).await.unwrap();
        store.create_delivery(&new_delivery(Some(alice))).await.unwrap();
        store.create_delivery(&new_delivery(Some(bob))).await.unwrap();

        assert_eq!(store.visible_deliveries(alice).await.len(), 2);
        assert_eq!(store.visible_statuses(bob).await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_status_appends_entry() {
        let store = MockStore::ephemeral(Vec::new());
        let delivery = store.create_delivery(&new_delivery(None)).await.unwrap();

        let updated = store
            .update_status(delivery.id, DeliveryStatus::Delivered, |d| DeliveryUpdate {
                status: "Delivered".to_string(),
                date: "June 3, 2025".to_string(),
                time: "2:15 PM".to_string(),
                description: "done".to_string(),
                location: Some(d.to.clone()),
            })
            .await
            .unwrap();

        assert_eq!(updated.status, DeliveryStatus::Delivered);
        assert_eq!(updated.updates.len(), 1);
        assert_eq!(updated.updates[0].location.as_deref(), Some("Denver, CO"));

        let missing = store
            .update_status(DeliveryId::new(1), DeliveryStatus::Pending, |_| {
                unreachable!("entry is only built for existing deliveries")
            })
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("mock.json");

        let store = MockStore::open(Some(path.clone()), Vec::new()).await.unwrap();
        store.create_user(&new_user("kim@example.com")).await.unwrap();
        let delivery = store.create_delivery(&new_delivery(None)).await.unwrap();
        store.set_image(delivery.id, "/static/uploads/x.png").await.unwrap();

        let reopened = MockStore::open(Some(path.clone()), Vec::new()).await.unwrap();
        let loaded = reopened
            .delivery_by_tracking_number(&delivery.tracking_number)
            .await
            .unwrap();
        assert_eq!(loaded.image_url.as_deref(), Some("/static/uploads/x.png"));
        assert!(
            reopened
                .user_by_email(&Email::parse("kim@example.com").unwrap())
                .await
                .is_some()
        );

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(raw["users"].is_array());
        assert!(raw["deliveries"].is_array());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mock.json");
        std::fs::write(&path, b"not json").unwrap();

        let result = MockStore::open(Some(path), Vec::new()).await;
        assert!(matches!(result, Err(RepositoryError::Snapshot(_))));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = MockStore::open(Some(blocker.join("mock.json")), Vec::new())
            .await
            .unwrap();

        let created = store.create_delivery(&new_delivery(None)).await;
        assert!(matches!(created, Err(RepositoryError::Snapshot(_))));
        assert!(store.visible_deliveries(UserId::new(1)).await.is_empty());

        let registered = store.create_user(&new_user("lee@example.com")).await;
        assert!(registered.is_err());
        assert!(
            store
                .user_by_email(&Email::parse("lee@example.com").unwrap())
                .await
                .is_none()
        );
    }
}
