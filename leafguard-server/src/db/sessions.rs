//! Session token queries
//!
//! Only token digests are stored; the plaintext tokens exist solely in
//! the HTTP response that minted them.

use crate::db::{settings, users};
use crate::error::Result;
use chrono::{Duration, Utc};
use leafguard_common::auth;
use leafguard_common::db::models::{Session, User};
use sqlx::SqlitePool;

/// A freshly minted token pair, returned to the client verbatim
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_in: i64,
}

/// Mint a new access/refresh token pair for a user
pub async fn create_session(pool: &SqlitePool, user_guid: &str) -> Result<IssuedTokens> {
    let access_ttl = settings::get_i64(pool, "session_access_ttl_seconds", 3600).await?;
    let refresh_ttl = settings::get_i64(pool, "session_refresh_ttl_seconds", 2_592_000).await?;

    let access_token = auth::generate_token();
    let refresh_token = auth::generate_token();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO sessions
            (token_hash, refresh_hash, user_guid, access_expires_at, refresh_expires_at, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth::token_digest(&access_token))
    .bind(auth::token_digest(&refresh_token))
    .bind(user_guid)
    .bind(now + Duration::seconds(access_ttl))
    .bind(now + Duration::seconds(refresh_ttl))
    .bind(now)
    .execute(pool)
    .await?;

    Ok(IssuedTokens {
        access_token,
        refresh_token,
        access_expires_in: access_ttl,
    })
}

/// Resolve an access token to its user
///
/// Returns None for unknown or expired tokens; expiry is compared in
/// application code to avoid relying on SQL text ordering of timestamps.
pub async fn user_for_access_token(pool: &SqlitePool, token: &str) -> Result<Option<User>> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = ?")
        .bind(auth::token_digest(token))
        .fetch_optional(pool)
        .await?;

    let session = match session {
        Some(s) if s.access_expires_at > Utc::now() => s,
        _ => return Ok(None),
    };

    users::get_user_by_guid(pool, &session.user_guid).await
}

/// Rotate a session from its refresh token
///
/// The old session row is deleted and a fresh pair is minted, so a
/// refresh token is single use.
pub async fn refresh_session(pool: &SqlitePool, refresh_token: &str) -> Result<Option<IssuedTokens>> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE refresh_hash = ?")
        .bind(auth::token_digest(refresh_token))
        .fetch_optional(pool)
        .await?;

    let session = match session {
        Some(s) if s.refresh_expires_at > Utc::now() => s,
        _ => return Ok(None),
    };

    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(&session.token_hash)
        .execute(pool)
        .await?;

    Ok(Some(create_session(pool, &session.user_guid).await?))
}

/// Drop expired sessions; called opportunistically at login
pub async fn prune_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE refresh_expires_at <= ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
