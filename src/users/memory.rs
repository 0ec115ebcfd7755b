use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{NewUser, User};

/// In-process store with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            age: new.age,
            avatar: None,
            tokens: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn save_profile(&self, user: &User) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::DuplicateEmail);
        }
        let Some(stored) = users.get_mut(&user.id) else {
            return Ok(None);
        };
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.age = user.age;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.write().await.remove(&id))
    }

    async fn push_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        Ok(self.update(id, |u| u.tokens.push(token.to_string())).await)
    }

    async fn remove_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        Ok(self.update(id, |u| u.tokens.retain(|t| t != token)).await)
    }

    async fn clear_tokens(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.update(id, |u| u.tokens.clear()).await)
    }

    async fn set_avatar(&self, id: Uuid, avatar: Option<Vec<u8>>) -> StoreResult<bool> {
        Ok(self
            .update(id, |u| {
                u.avatar = avatar;
                u.updated_at = OffsetDateTime::now_utc();
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            age: 0,
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.insert(new_user("a@x.com")).await.unwrap();
        let err = store.insert(new_user("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn token_operations_keep_issue_order() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("b@x.com")).await.unwrap();
        assert!(store.push_token(user.id, "t1").await.unwrap());
        assert!(store.push_token(user.id, "t2").await.unwrap());
        assert!(store.remove_token(user.id, "t1").await.unwrap());
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.tokens, vec!["t2".to_string()]);
        assert!(!store.push_token(Uuid::new_v4(), "t3").await.unwrap());
    }
}
