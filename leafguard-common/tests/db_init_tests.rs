//! Tests for database initialization and schema constraints

use chrono::Utc;
use leafguard_common::db::init::init_database;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

async fn setup() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("leafguard.db")).await.unwrap();
    (dir, pool)
}

async fn insert_user(pool: &SqlitePool, username: &str) -> String {
    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO users (guid, username, password_hash, password_salt, created_at) \
         VALUES (?, ?, '', '', ?)",
    )
    .bind(&guid)
    .bind(username)
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();
    guid
}

async fn insert_disease(pool: &SqlitePool, class_name: &str) -> String {
    let guid = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO plant_diseases (guid, class_name, name, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(class_name)
    .bind(class_name)
    .bind(Utc::now())
    .bind(Utc::now())
    .execute(pool)
    .await
    .unwrap();
    guid
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("leafguard.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_init_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("leafguard.db");

    let pool1 = init_database(&db_path).await.unwrap();
    drop(pool1);

    // Second init must succeed and must not duplicate the default room
    let pool2 = init_database(&db_path).await.unwrap();
    let room_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_rooms")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(room_count, 1);
}

#[tokio::test]
async fn test_default_settings_initialized() {
    let (_dir, pool) = setup().await;

    let value: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'prediction_top_k'")
            .fetch_optional(&pool)
            .await
            .unwrap();

    assert_eq!(value.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_default_community_room_created() {
    let (_dir, pool) = setup().await;

    let name: Option<String> = sqlx::query_scalar("SELECT name FROM chat_rooms LIMIT 1")
        .fetch_optional(&pool)
        .await
        .unwrap();

    assert_eq!(name.as_deref(), Some("community"));
}

#[tokio::test]
async fn test_chat_message_requires_existing_room_and_user() {
    let (_dir, pool) = setup().await;

    let result = sqlx::query(
        "INSERT INTO chat_messages (guid, room_guid, user_guid, content, created_at) \
         VALUES (?, 'no-such-room', 'no-such-user', 'hi', ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(Utc::now())
    .execute(&pool)
    .await;

    assert!(result.is_err(), "FK violation should fail the insert");
}

#[tokio::test]
async fn test_prediction_confidence_range_enforced() {
    let (_dir, pool) = setup().await;
    let user_guid = insert_user(&pool, "grower").await;
    let disease_guid = insert_disease(&pool, "Tomato___Late_blight").await;

    for bad in [-0.1_f64, 1.5_f64] {
        let result = sqlx::query(
            "INSERT INTO predictions \
             (guid, user_guid, disease_guid, image_path, confidence_score, is_offline, created_at) \
             VALUES (?, ?, ?, 'x.jpg', ?, 0, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user_guid)
        .bind(&disease_guid)
        .bind(bad)
        .bind(Utc::now())
        .execute(&pool)
        .await;

        assert!(result.is_err(), "confidence {} should violate the CHECK", bad);
    }

    // In-range value is accepted
    let ok = sqlx::query(
        "INSERT INTO predictions \
         (guid, user_guid, disease_guid, image_path, confidence_score, is_offline, created_at) \
         VALUES (?, ?, ?, 'x.jpg', 0.93, 0, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&user_guid)
    .bind(&disease_guid)
    .bind(Utc::now())
    .execute(&pool)
    .await;
    assert!(ok.is_ok());
}

#[tokio::test]
async fn test_prediction_requires_known_user_and_disease() {
    let (_dir, pool) = setup().await;

    let result = sqlx::query(
        "INSERT INTO predictions \
         (guid, user_guid, disease_guid, image_path, confidence_score, is_offline, created_at) \
         VALUES (?, 'ghost', 'phantom', 'x.jpg', 0.5, 0, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(Utc::now())
    .execute(&pool)
    .await;

    assert!(result.is_err(), "unknown references should fail with a referential error");
}

#[tokio::test]
async fn test_room_delete_cascades_to_messages() {
    let (_dir, pool) = setup().await;
    let user_guid = insert_user(&pool, "grower").await;

    let room_guid: String = sqlx::query_scalar("SELECT guid FROM chat_rooms LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO chat_messages (guid, room_guid, user_guid, content, created_at) \
         VALUES (?, ?, ?, 'hello', ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&room_guid)
    .bind(&user_guid)
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    sqlx::query("DELETE FROM chat_rooms WHERE guid = ?")
        .bind(&room_guid)
        .execute(&pool)
        .await
        .unwrap();

    let message_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(message_count, 0, "messages are owned by their room");
}
