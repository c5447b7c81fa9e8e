//! Settings table accessors

use crate::error::Result;
use sqlx::SqlitePool;

/// Read an integer setting, falling back to a default when the key is
/// missing or unparseable
pub async fn get_i64(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?
        .flatten();

    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(default))
}
