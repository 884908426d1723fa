use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User, UserId},
    traits::AuthApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let email = user.email.clone();
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.full_name)
    .bind(user.role)
    .fetch_one(conn)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AuthApiError::EmailAlreadyRegistered(email),
        _ => AuthApiError::from(e),
    })?;
    debug!("🗃️ New {} account created for {}", user.role, user.id);
    Ok(user)
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

/// The `email` column uses `NOCASE` collation, so the lookup is case-insensitive.
pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}
