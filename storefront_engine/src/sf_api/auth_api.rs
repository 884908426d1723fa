use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, Role, User, UserId},
    helpers::{hash_password, verify_password},
    traits::{AuthApiError, UserManagement},
};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// `AuthApi` registers accounts and checks credentials. Issuing access tokens for an authenticated user is left to the
/// caller.
pub struct AuthApi<B> {
    db: B,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Creates a new account with the given role. The password is hashed on the blocking thread pool.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<User, AuthApiError> {
        let email = email.trim();
        let full_name = full_name.trim();
        validate_registration(email, password, full_name)?;
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?
            .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?;
        let user = NewUser { email: email.to_string(), password_hash, full_name: full_name.to_string(), role };
        let user = self.db.insert_user(user).await?;
        info!("🔑️ New {} account registered: {}", user.role, user.id);
        Ok(user)
    }

    /// Checks the credentials and returns the matching user. An unknown email and a wrong password are reported the
    /// same way.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthApiError> {
        let user = self.db.fetch_user_by_email(email.trim()).await?.ok_or_else(|| {
            debug!("🔑️ Login attempt for an unknown email address");
            AuthApiError::InvalidCredentials
        })?;
        let password = password.to_string();
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| AuthApiError::PasswordHashError(e.to_string()))?;
        match verified {
            Ok(true) => {
                debug!("🔑️ {} logged in", user.id);
                Ok(user)
            },
            Ok(false) => {
                debug!("🔑️ Wrong password given for {}", user.id);
                Err(AuthApiError::InvalidCredentials)
            },
            Err(e) => {
                error!("🔑️ The password hash for {} cannot be read. {e}", user.id);
                Err(AuthApiError::InvalidCredentials)
            },
        }
    }

    pub async fn user(&self, id: UserId) -> Result<User, AuthApiError> {
        self.db.fetch_user(id).await?.ok_or(AuthApiError::UserNotFound(id))
    }
}

fn validate_registration(email: &str, password: &str, full_name: &str) -> Result<(), AuthApiError> {
    if !email.contains('@') {
        return Err(AuthApiError::InvalidRegistration("The email address is not valid".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthApiError::InvalidRegistration(format!(
            "The password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if full_name.is_empty() {
        return Err(AuthApiError::InvalidRegistration("A full name is required".into()));
    }
    Ok(())
}
