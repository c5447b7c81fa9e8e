//! User account queries

use crate::error::{Error, Result};
use chrono::Utc;
use leafguard_common::db::models::User;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Insert a new user; fails with `BadRequest` when the username is taken
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    password_salt: &str,
) -> Result<User> {
    let guid = Uuid::new_v4().to_string();
    let created_at = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (guid, username, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(username)
    .bind(password_hash)
    .bind(password_salt)
    .bind(created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(User {
            guid,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            password_salt: password_salt.to_string(),
            created_at,
        }),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(Error::BadRequest("username already taken".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_guid(pool: &SqlitePool, guid: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}
