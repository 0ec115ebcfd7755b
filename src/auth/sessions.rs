use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::{
    error::{AppError, Result},
    state::AppState,
    users::{repo::UserStore, repo_types::User},
};

/// Issues, checks and revokes per-device session tokens.
///
/// A signature alone is not enough: a token is valid only while its exact
/// string is still in the owner's stored token list.
#[derive(Clone)]
pub struct SessionManager {
    keys: JwtKeys,
    users: Arc<dyn UserStore>,
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        Self::new(JwtKeys::from_ref(state), state.users.clone())
    }
}

impl SessionManager {
    pub fn new(keys: JwtKeys, users: Arc<dyn UserStore>) -> Self {
        Self { keys, users }
    }

    pub async fn issue(&self, user: &User) -> Result<String> {
        let token = self.keys.sign(user.id)?;
        if !self.users.push_token(user.id, &token).await? {
            return Err(AppError::NotFound("User not found".into()));
        }
        info!(user_id = %user.id, "session token issued");
        Ok(token)
    }

    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            AppError::Unauthorized
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown user");
                AppError::Unauthorized
            })?;

        if !user.has_token(token) {
            warn!(user_id = %user.id, "revoked token presented");
            return Err(AppError::Unauthorized);
        }

        debug!(user_id = %user.id, "session authenticated");
        Ok(user)
    }

    /// Removing a token that is already gone is not an error.
    pub async fn revoke(&self, user_id: Uuid, token: &str) -> Result<()> {
        self.users.remove_token(user_id, token).await?;
        info!(user_id = %user_id, "session token revoked");
        Ok(())
    }

    pub async fn revoke_all(&self, user_id: Uuid) -> Result<()> {
        self.users.clear_tokens(user_id).await?;
        info!(user_id = %user_id, "all session tokens revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo_types::NewUser;

    async fn setup() -> (SessionManager, User) {
        let state = AppState::fake();
        let sessions = SessionManager::from_ref(&state);
        let user = state
            .users
            .insert(NewUser {
                name: "Alice".into(),
                email: "alice@x.com".into(),
                password_hash: "hash".into(),
                age: 0,
            })
            .await
            .unwrap();
        (sessions, user)
    }

    #[tokio::test]
    async fn issued_token_authenticates_until_revoked() {
        let (sessions, user) = setup().await;
        let token = sessions.issue(&user).await.unwrap();

        let authed = sessions.authenticate(&token).await.unwrap();
        assert_eq!(authed.id, user.id);

        sessions.revoke(user.id, &token).await.unwrap();
        let err = sessions.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let (sessions, user) = setup().await;
        let token = sessions.issue(&user).await.unwrap();
        sessions.revoke(user.id, &token).await.unwrap();
        sessions.revoke(user.id, &token).await.unwrap();
        sessions.revoke(user.id, "never-issued").await.unwrap();
    }

    #[tokio::test]
    async fn revoke_only_touches_the_given_token() {
        let (sessions, user) = setup().await;
        let phone = sessions.issue(&user).await.unwrap();
        let laptop = sessions.issue(&user).await.unwrap();
        sessions.revoke(user.id, &phone).await.unwrap();
        assert!(sessions.authenticate(&phone).await.is_err());
        assert!(sessions.authenticate(&laptop).await.is_ok());
    }

    #[tokio::test]
    async fn revoke_all_invalidates_every_token() {
        let (sessions, user) = setup().await;
        let t1 = sessions.issue(&user).await.unwrap();
        let t2 = sessions.issue(&user).await.unwrap();
        sessions.revoke_all(user.id).await.unwrap();
        assert!(matches!(
            sessions.authenticate(&t1).await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            sessions.authenticate(&t2).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn well_signed_token_not_in_store_is_rejected() {
        let (sessions, user) = setup().await;
        let forged = sessions.keys.sign(user.id).unwrap();
        assert!(matches!(
            sessions.authenticate(&forged).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn token_of_deleted_user_is_rejected() {
        let state = AppState::fake();
        let sessions = SessionManager::from_ref(&state);
        let user = state
            .users
            .insert(NewUser {
                name: "Bob".into(),
                email: "bob@x.com".into(),
                password_hash: "hash".into(),
                age: 3,
            })
            .await
            .unwrap();
        let token = sessions.issue(&user).await.unwrap();
        state.users.delete(user.id).await.unwrap();
        assert!(matches!(
            sessions.authenticate(&token).await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let (sessions, _) = setup().await;
        assert!(matches!(
            sessions.authenticate("garbage").await,
            Err(AppError::Unauthorized)
        ));
    }
}
