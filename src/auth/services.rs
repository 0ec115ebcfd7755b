use tracing::{info, warn};

use super::password::{verify_against_dummy_blocking, verify_password_blocking};
use crate::{
    error::{AppError, Result},
    users::{repo::UserStore, repo_types::User, validation::normalize_email},
};

/// Looks a user up by email and checks the password.
///
/// Unknown email and wrong password fail identically.
pub async fn find_by_credentials(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<User> {
    let email = normalize_email(email);

    let Some(user) = users.find_by_email(&email).await? else {
        verify_against_dummy_blocking(password.to_string()).await;
        warn!("login with unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, "credentials verified");
    Ok(user)
}
