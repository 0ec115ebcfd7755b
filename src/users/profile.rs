use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{
    dto::ProfileUpdate,
    repo::UserStore,
    repo_types::User,
    validation::{validate_age, validate_email, validate_name, validate_password},
};
use crate::{
    auth::password::hash_password_blocking,
    error::{AppError, Result},
};

pub const ALLOWED_UPDATES: [&str; 4] = ["name", "email", "password", "age"];

/// Applies a partial profile update.
///
/// The whole field map is checked before anything changes: an unknown key or
/// an invalid value leaves the stored record untouched.
pub async fn apply_update(
    users: &dyn UserStore,
    user: &User,
    fields: Map<String, Value>,
) -> Result<User> {
    if let Some(key) = fields.keys().find(|k| !ALLOWED_UPDATES.contains(&k.as_str())) {
        warn!(user_id = %user.id, field = %key, "rejected profile update");
        return Err(AppError::Validation("Invalid updates!".to_string()));
    }

    let update: ProfileUpdate = serde_json::from_value(Value::Object(fields))
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut next = user.clone();
    if let Some(name) = update.name {
        next.name = validate_name(&name)?;
    }
    if let Some(email) = update.email {
        next.email = validate_email(&email)?;
    }
    if let Some(age) = update.age {
        next.age = validate_age(age)?;
    }
    if let Some(password) = update.password {
        let password = validate_password(&password)?;
        next.password_hash = hash_password_blocking(password).await?;
    }

    let saved = users
        .save_profile(&next)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    info!(user_id = %saved.id, "profile updated");
    Ok(saved)
}
