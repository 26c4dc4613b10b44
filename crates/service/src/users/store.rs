use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{NewUser, User, UserPatch};
use super::errors::UserError;
use super::password::{hash_password_blocking, verify_password_blocking};
use super::repository::UserRepository;
use crate::storage::json_map_store::JsonMapStore;

/// Produces candidate user ids; the store retries on collision.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// File-backed user store: `id -> User`, mirrored to one JSON snapshot.
pub struct UserStore {
    users: Arc<JsonMapStore<String, User>>,
    next_id: IdGenerator,
}

impl UserStore {
    /// Load users from `path`. A missing or malformed file yields an empty store.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, UserError> {
        let users = JsonMapStore::<String, User>::new(path).await?;
        info!(users = users.count().await, "user store loaded");
        Ok(Self { users, next_id: Arc::new(|| Uuid::new_v4().to_string()) })
    }

    pub fn with_id_generator(mut self, next_id: IdGenerator) -> Self {
        self.next_id = next_id;
        self
    }

    fn unique_id(&self, existing: &HashMap<String, User>) -> String {
        let mut id = (self.next_id)();
        while existing.contains_key(&id) {
            debug!(%id, "id collision; regenerating");
            id = (self.next_id)();
        }
        id
    }

    async fn insert_new(&self, input: NewUser, check_email: bool) -> Result<User, UserError> {
        let password = hash_password_blocking(input.password).await?;
        self.users
            .update_map(|m| {
                if check_email && m.values().any(|u| u.email == input.email) {
                    return Err(UserError::Conflict);
                }
                let user = User {
                    id: self.unique_id(m),
                    username: input.username,
                    email: input.email,
                    password,
                };
                m.insert(user.id.clone(), user.clone());
                Ok(user)
            })
            .await
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_all(&self) -> Vec<User> {
        self.users.values().await
    }

    async fn find_one(&self, id: &str) -> Option<User> {
        self.users.get(&id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.find_value(|u| u.email == email).await
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn create(&self, input: NewUser) -> Result<User, UserError> {
        let user = self.insert_new(input, false).await?;
        info!(user_id = %user.id, "user_created");
        Ok(user)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    async fn register(&self, input: NewUser) -> Result<User, UserError> {
        let user = self.insert_new(input, true).await?;
        info!(user_id = %user.id, "user_registered");
        Ok(user)
    }

    #[instrument(skip(self, supplied))]
    async fn compare_password(&self, email: &str, supplied: &str) -> Result<User, UserError> {
        let user = self.find_by_email(email).await.ok_or(UserError::NotFound)?;
        if verify_password_blocking(supplied.to_string(), user.password.clone()).await? {
            Ok(user)
        } else {
            debug!(user_id = %user.id, "password mismatch");
            Err(UserError::PasswordMismatch)
        }
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &str, mut patch: UserPatch) -> Result<User, UserError> {
        if self.find_one(id).await.is_none() {
            return Err(UserError::NotFound);
        }
        if let Some(plain) = patch.password.take() {
            patch.password = Some(hash_password_blocking(plain).await?);
        }
        let updated = self
            .users
            .update_map(|m| {
                // re-checked under the lock: a delete may have raced the hashing
                let user = m.get_mut(id).ok_or(UserError::NotFound)?;
                user.apply(patch);
                Ok::<_, UserError>(user.clone())
            })
            .await?;
        info!(user_id = %updated.id, "user_updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<(), UserError> {
        if !self.users.remove(&id.to_string()).await? {
            return Err(UserError::NotFound);
        }
        info!(user_id = %id, "user_deleted");
        Ok(())
    }
}
