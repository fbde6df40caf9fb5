//! First-run administrator.

use crate::auth::Passwords;
use crate::db::{Datastore, SqlStore};
use crate::error::AuthError;
use crate::models::{NewUser, Role};
use crate::settings::BootstrapSettings;

/// Create the configured administrator unless a user with that username
/// already exists. Returns the id of a newly created user.
pub async fn ensure_admin(
    store: &SqlStore,
    passwords: &Passwords,
    settings: &BootstrapSettings,
) -> Result<Option<i64>, AuthError> {
    let (Some(username), Some(password)) = (&settings.admin_username, &settings.admin_password)
    else {
        tracing::debug!("no bootstrap administrator configured");
        return Ok(None);
    };

    if store.user_by_username(username).await?.is_some() {
        return Ok(None);
    }

    let id = store
        .insert_user(&NewUser {
            name: settings.admin_name.clone(),
            username: username.clone(),
            password_hash: passwords.hash(password)?,
            role: Role::Admin,
        })
        .await?;
    tracing::info!(user_id = id, username = %username, "bootstrap administrator created");
    Ok(Some(id))
}
