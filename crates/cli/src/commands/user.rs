//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! bzt-cli user create -e jo@example.com -n "Jo Courier" -p "correct horse"
//! ```

use beezetrack_core::UserId;
use beezetrack_server::services::auth::{AuthError, AuthService, SignupRequest};
use beezetrack_server::store::DataStore;

use super::connect;

/// Create an account with an argon2-hashed password.
///
/// Goes through the same validation as signup.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    password: &str,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let store = DataStore::Postgres(connect().await?);

    let request = SignupRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        ..SignupRequest::default()
    };

    match AuthService::new(&store).register(request).await {
        Ok(user) => Ok(user.id),
        Err(AuthError::UserAlreadyExists) => {
            Err(format!("User already exists with email: {email}").into())
        }
        Err(e) => Err(e.into()),
    }
}
