use async_trait::async_trait;

use super::domain::{NewUser, User, UserPatch};
use super::errors::UserError;

/// Repository abstraction the HTTP layer depends on.
/// Lookups return `None` for unknown ids or emails; they never fail.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_all(&self) -> Vec<User>;
    async fn find_one(&self, id: &str) -> Option<User>;
    /// Case-sensitive exact match on email.
    async fn find_by_email(&self, email: &str) -> Option<User>;
    /// Store a new user. Email uniqueness is not checked here.
    async fn create(&self, input: NewUser) -> Result<User, UserError>;
    /// Check the email is free and create the user under one write lock.
    async fn register(&self, input: NewUser) -> Result<User, UserError>;
    /// `NotFound` for an unknown email, `PasswordMismatch` for a wrong password.
    async fn compare_password(&self, email: &str, supplied: &str) -> Result<User, UserError>;
    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, UserError>;
    async fn delete(&self, id: &str) -> Result<(), UserError>;
}
