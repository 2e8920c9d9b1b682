//! Domain models for the tracking server.

pub mod delivery;
pub mod session;
pub mod user;

pub use delivery::{Delivery, DeliveryDraft, DeliveryUpdate, NewDelivery, PickupSlot};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, Profile, ProfileChanges, User};
