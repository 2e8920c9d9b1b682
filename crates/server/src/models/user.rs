//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use beezetrack_core::{Email, UserId};

/// A BeezeTrack account.
///
/// The password hash is kept out of this type so it can never be serialized
/// into a response by accident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: Email,
    #[serde(flatten)]
    pub profile: Profile,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Optional contact details shown on the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

/// Partial profile update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
}

impl Profile {
    /// Overwrite every field that `changes` sets.
    pub fn apply(&mut self, changes: &ProfileChanges) {
        let fields = [
            (&mut self.phone, &changes.phone),
            (&mut self.address, &changes.address),
            (&mut self.city, &changes.city),
            (&mut self.state, &changes.state),
            (&mut self.zip_code, &changes.zip_code),
            (&mut self.bio, &changes.bio),
            (&mut self.company, &changes.company),
        ];
        for (field, change) in fields {
            if let Some(value) = change {
                *field = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
        }
    }
}

/// A user that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub profile: Profile,
    /// Argon2 PHC string. Mock accounts have none.
    pub password_hash: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_changes_only_touches_set_fields() {
        let mut profile = Profile {
            phone: Some("555-0100".to_string()),
            city: Some("Austin".to_string()),
            ..Profile::default()
        };
        let changes = ProfileChanges {
            city: Some("Denver".to_string()),
            bio: Some("Ships a lot".to_string()),
            ..ProfileChanges::default()
        };

        profile.apply(&changes);

        assert_eq!(profile.phone.as_deref(), Some("555-0100"));
        assert_eq!(profile.city.as_deref(), Some("Denver"));
        assert_eq!(profile.bio.as_deref(), Some("Ships a lot"));
    }

    #[test]
    fn test_apply_blank_clears_field() {
        let mut profile = Profile {
            company: Some("Acme".to_string()),
            ..Profile::default()
        };
        profile.apply(&ProfileChanges {
            company: Some("  ".to_string()),
            ..ProfileChanges::default()
        });
        assert!(profile.company.is_none());
    }

    #[test]
    fn test_user_json_shape() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(7),
            name: "Jane Doe".to_string(),
            email: Email::parse("jane@example.com").unwrap(),
            profile: Profile {
                zip_code: Some("10001".to_string()),
                ..Profile::default()
            },
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["zipCode"], "10001");
        assert!(json.get("phone").is_none());
        assert!(json.get("passwordHash").is_none());

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
