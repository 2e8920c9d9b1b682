//! Authentication service.
//!
//! Provides signup, login, profile and password management. In mock mode
//! passwords are never checked and an unknown email logs straight in as a
//! new account.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::{info, instrument};

use beezetrack_core::{Email, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::models::user::{NewUser, Profile, ProfileChanges, User};
use crate::store::DataStore;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum display name length.
pub const MIN_NAME_LENGTH: usize = 2;

/// Signup form data, shared by the JSON API and the HTML form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Checked against `password` when present.
    pub confirm_password: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Password change request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    store: &'a DataStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a DataStore) -> Self {
        Self { store }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for bad input and
    /// `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: SignupRequest) -> Result<User, AuthError> {
        let name = validate_name(&request.name)?;
        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;
        if let Some(confirm) = &request.confirm_password {
            validate_confirmation(&request.password, confirm)?;
        }

        let password_hash = if self.store.is_mock() {
            None
        } else {
            Some(hash_password(&request.password)?)
        };

        let new_user = NewUser {
            name,
            email,
            profile: request.profile,
            password_hash,
        };
        let user = self
            .store
            .create_user(&new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Log in with email and password.
    ///
    /// In mock mode any password is accepted and an unknown email creates an
    /// account named after the email's local part.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        match self.store {
            DataStore::Mock(_) => {
                if let Some(user) = self.store.user_by_email(&email).await? {
                    return Ok(user);
                }
                let new_user = NewUser {
                    name: email.display_name(),
                    email,
                    profile: Profile::default(),
                    password_hash: None,
                };
                let user = self.store.create_user(&new_user).await?;
                info!(user_id = %user.id, "Created mock account on first login");
                Ok(user)
            }
            DataStore::Postgres(pool) => {
                let (user, password_hash) = UserRepository::new(pool)
                    .get_password_hash(&email)
                    .await?
                    .ok_or(AuthError::InvalidCredentials)?;
                let password_hash = password_hash.ok_or(AuthError::InvalidCredentials)?;

                verify_password(password, &password_hash)?;
                Ok(user)
            }
        }
    }

    /// Reload the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn current_user(&self, id: UserId) -> Result<User, AuthError> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Apply a partial profile update.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::InvalidEmail` for bad
    /// input and `AuthError::UserAlreadyExists` if the new email is taken.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, AuthError> {
        let user = self.current_user(id).await?;

        let name = match &changes.name {
            Some(name) => validate_name(name)?,
            None => user.name,
        };
        let email = match &changes.email {
            Some(email) => Email::parse(email)?,
            None => user.email,
        };
        let mut profile = user.profile;
        profile.apply(changes);

        self.store
            .update_profile(id, &name, &email, &profile)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }

    /// Change a user's password.
    ///
    /// The current password is only verified in database mode.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the new password is too short or
    /// unconfirmed and `AuthError::IncorrectPassword` if `current_password`
    /// does not match.
    #[instrument(skip(self, change))]
    pub async fn change_password(
        &self,
        id: UserId,
        change: &PasswordChange,
    ) -> Result<(), AuthError> {
        validate_password(&change.new_password)?;
        validate_confirmation(&change.new_password, &change.confirm_password)?;

        match self.store {
            DataStore::Mock(_) => {
                self.current_user(id).await?;
            }
            DataStore::Postgres(pool) => {
                let users = UserRepository::new(pool);
                let current_hash = users.password_hash_for(id).await.map_err(|e| match e {
                    RepositoryError::NotFound => AuthError::UserNotFound,
                    other => AuthError::Repository(other),
                })?;
                let current_hash = current_hash.ok_or(AuthError::IncorrectPassword)?;
                verify_password(&change.current_password, &current_hash)
                    .map_err(|_| AuthError::IncorrectPassword)?;

                let new_hash = hash_password(&change.new_password)?;
                users.update_password(id, &new_hash).await?;
            }
        }

        info!(user_id = %id, "Password changed");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, AuthError> {
    let name = name.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "Name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_confirmation(password: &str, confirm: &str) -> Result<(), AuthError> {
    if password != confirm {
        return Err(AuthError::WeakPassword("Passwords do not match".to_string()));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
