//! User account store

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::Utc;
use common::JsonCollection;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::{ShopError, ShopResult},
    models::{Role, User},
};

/// User store
#[derive(Clone)]
pub struct UserStore {
    users: Arc<Mutex<Vec<User>>>,
    collection: Arc<JsonCollection<User>>,
}

impl UserStore {
    pub async fn load(collection: JsonCollection<User>) -> ShopResult<Self> {
        let users = collection.load_all().await?;
        info!("Loaded {} users", users.len());

        Ok(Self {
            users: Arc::new(Mutex::new(users)),
            collection: Arc::new(collection),
        })
    }

    /// Create a new account with the `user` role
    pub async fn register(&self, username: &str, password: &str, email: &str) -> ShopResult<User> {
        self.insert(username, password, email, Role::User).await
    }

    /// Create an account with an explicit role
    pub async fn insert(
        &self,
        username: &str,
        password: &str,
        email: &str,
        role: Role,
    ) -> ShopResult<User> {
        info!("Creating new user: {}", username);

        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.username == username) {
            return Err(ShopError::UsernameTaken);
        }

        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            username: username.to_string(),
            password_hash: hash_password(password)?,
            email: email.to_string(),
            role,
            registered_at: Utc::now(),
        };

        let mut next = users.clone();
        next.push(user.clone());
        self.collection.save_all(&next).await?;
        *users = next;

        Ok(user)
    }

    /// The user matching both username and password
    pub async fn authenticate(&self, username: &str, password: &str) -> ShopResult<User> {
        let user = self
            .find_by_username(username)
            .await
            .ok_or(ShopError::InvalidCredentials)?;

        if verify_password(&user, password)? {
            Ok(user)
        } else {
            warn!("Wrong password for user: {}", username);
            Err(ShopError::InvalidCredentials)
        }
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: u32) -> Option<User> {
        self.users.lock().await.iter().find(|u| u.id == id).cloned()
    }

    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        user_id: u32,
        old_password: &str,
        new_password: &str,
    ) -> ShopResult<()> {
        let mut users = self.users.lock().await;
        let mut next = users.clone();

        let user = next
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| ShopError::NotFound(format!("User {user_id} not found")))?;
        if !verify_password(user, old_password)? {
            return Err(ShopError::Validation(
                "Old password is incorrect".to_string(),
            ));
        }
        user.password_hash = hash_password(new_password)?;

        self.collection.save_all(&next).await?;
        *users = next;

        info!("Password changed for user {}", user_id);
        Ok(())
    }
}

fn hash_password(password: &str) -> ShopResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ShopError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(user: &User, password: &str) -> ShopResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ShopError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (UserStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(JsonCollection::new(dir.path(), "users"))
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (users, _dir) = store().await;

        let alice = users.register("alice", "secret1", "a@x.com").await.unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(alice.role, Role::User);
        assert_ne!(alice.password_hash, "secret1");

        assert!(matches!(
            users.register("alice", "other12", "b@x.com").await,
            Err(ShopError::UsernameTaken)
        ));

        assert_eq!(users.authenticate("alice", "secret1").await.unwrap().id, 1);
        assert!(matches!(
            users.authenticate("alice", "wrong").await,
            Err(ShopError::InvalidCredentials)
        ));
        assert!(matches!(
            users.authenticate("bob", "secret1").await,
            Err(ShopError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let (users, _dir) = store().await;
        let a = users.register("alice", "secret1", "a@x.com").await.unwrap();
        let b = users.register("bob", "secret1", "b@x.com").await.unwrap();

        assert_eq!(b.id, 2);
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[tokio::test]
    async fn test_change_password_requires_old() {
        let (users, dir) = store().await;
        let alice = users.register("alice", "secret1", "a@x.com").await.unwrap();

        assert!(matches!(
            users.change_password(alice.id, "nope", "secret2").await,
            Err(ShopError::Validation(_))
        ));
        users
            .change_password(alice.id, "secret1", "secret2")
            .await
            .unwrap();

        let reloaded = UserStore::load(JsonCollection::new(dir.path(), "users"))
            .await
            .unwrap();
        assert!(reloaded.authenticate("alice", "secret2").await.is_ok());
        assert!(reloaded.authenticate("alice", "secret1").await.is_err());
    }
}
