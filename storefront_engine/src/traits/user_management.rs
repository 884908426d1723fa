use thiserror::Error;

use crate::db_types::{NewUser, User, UserId};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The email address {0} is already registered")]
    EmailAlreadyRegistered(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("The user {0} does not exist")]
    UserNotFound(UserId),
    #[error("Invalid registration details: {0}")]
    InvalidRegistration(String),
    #[error("Could not hash password: {0}")]
    PasswordHashError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Backend behaviour for storing user accounts.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Stores a new user. If the email address is taken, [`AuthApiError::EmailAlreadyRegistered`] is returned.
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<User>, AuthApiError>;

    /// Email addresses are matched case-insensitively.
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;
}
