//! Database initialization
//!
//! Creates the SQLite database on first run, applies the schema
//! idempotently, and seeds default settings plus the default community
//! chat room.

use crate::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Foreign keys are a per-connection pragma, so they are part of the
    // connect options: required ChatMessage/Prediction references are
    // enforced by the schema, not in application code. WAL allows
    // concurrent readers with one writer.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Schema creation is idempotent - safe to call multiple times
    create_users_table(&pool).await?;
    create_sessions_table(&pool).await?;
    create_settings_table(&pool).await?;
    create_chat_rooms_table(&pool).await?;
    create_chat_messages_table(&pool).await?;
    create_plant_diseases_table(&pool).await?;
    create_predictions_table(&pool).await?;

    init_default_settings(&pool).await?;
    ensure_default_room(&pool).await?;

    Ok(pool)
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            refresh_hash TEXT NOT NULL UNIQUE,
            user_guid TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            access_expires_at TIMESTAMP NOT NULL,
            refresh_expires_at TIMESTAMP NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chat_rooms_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_rooms (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_chat_messages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chat_messages (
            guid TEXT PRIMARY KEY,
            room_guid TEXT NOT NULL REFERENCES chat_rooms(guid) ON DELETE CASCADE,
            user_guid TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            content TEXT NOT NULL DEFAULT '',
            image_path TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Message history is read newest-first per room
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_chat_messages_room ON chat_messages(room_guid, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the plant disease catalog table
///
/// `class_name` uniquely identifies a catalog entry within the
/// classifier's label space; `name` is the derived display name.
pub async fn create_plant_diseases_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plant_diseases (
            guid TEXT PRIMARY KEY,
            class_name TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            scientific_name TEXT,
            description TEXT NOT NULL DEFAULT '',
            symptoms TEXT NOT NULL DEFAULT '',
            treatment TEXT NOT NULL DEFAULT '',
            prevention TEXT NOT NULL DEFAULT '',
            image_url TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_diseases_class_name ON plant_diseases(class_name)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the predictions table
///
/// Rows are immutable once created; confidence is constrained to [0, 1]
/// at the schema level.
pub async fn create_predictions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            guid TEXT PRIMARY KEY,
            user_guid TEXT NOT NULL REFERENCES users(guid) ON DELETE CASCADE,
            disease_guid TEXT NOT NULL REFERENCES plant_diseases(guid) ON DELETE CASCADE,
            image_path TEXT NOT NULL,
            confidence_score REAL NOT NULL,
            is_offline INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (confidence_score >= 0.0 AND confidence_score <= 1.0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_predictions_user ON predictions(user_guid, created_at)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_predictions_disease ON predictions(disease_guid)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values and resets
/// NULL values to defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Session and authentication settings
    ensure_setting(pool, "session_access_ttl_seconds", "3600").await?; // 1 hour
    ensure_setting(pool, "session_refresh_ttl_seconds", "2592000").await?; // 30 days

    // Chat settings
    ensure_setting(pool, "chat_history_page_size", "100").await?;
    ensure_setting(pool, "chat_fanout_capacity", "100").await?;

    // Prediction settings
    ensure_setting(pool, "prediction_top_k", "3").await?;
    ensure_setting(pool, "recent_predictions_limit", "5").await?;
    ensure_setting(pool, "common_diseases_limit", "10").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization races
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;
        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Create the default community chat room when no rooms exist yet
async fn ensure_default_room(pool: &SqlitePool) -> Result<()> {
    let room_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_rooms")
        .fetch_one(pool)
        .await?;

    if room_count == 0 {
        sqlx::query(
            "INSERT INTO chat_rooms (guid, name, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind("community")
        .bind("Leafguard Community Chat - Ask questions and share plant health tips!")
        .bind(Utc::now())
        .execute(pool)
        .await?;

        info!("Created default community chat room");
    }

    Ok(())
}
