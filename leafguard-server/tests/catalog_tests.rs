//! Tests for disease catalog creation and import upserts

use leafguard_common::db::init_database;
use leafguard_server::catalog_info;
use leafguard_server::db::prediction;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("test.db")).await.unwrap();
    (dir, pool)
}

/// Upsert a class the way the import binary does
async fn import_class(pool: &SqlitePool, class_name: &str) {
    let entry = catalog_info::entry_for(class_name);
    prediction::upsert_disease(
        pool,
        class_name,
        entry.scientific_name,
        &entry.description,
        &entry.symptoms,
        &entry.treatment,
        &entry.prevention,
        entry.image_url,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_autocreated_disease_has_placeholder_text() {
    let (_dir, pool) = setup().await;

    let disease = prediction::get_or_create_disease(&pool, "Tomato___Late_blight")
        .await
        .unwrap();

    assert_eq!(disease.name, "Tomato - Late blight");
    assert_eq!(disease.description, prediction::AUTO_CREATED_TEXT);
    assert_eq!(disease.symptoms, prediction::AUTO_CREATED_TEXT);
    assert_eq!(disease.treatment, prediction::AUTO_CREATED_TEXT);
    assert_eq!(disease.prevention, prediction::AUTO_CREATED_TEXT);
}

#[tokio::test]
async fn test_get_or_create_returns_existing_row() {
    let (_dir, pool) = setup().await;

    let first = prediction::get_or_create_disease(&pool, "Tomato___Late_blight")
        .await
        .unwrap();
    let second = prediction::get_or_create_disease(&pool, "Tomato___Late_blight")
        .await
        .unwrap();

    assert_eq!(first.guid, second.guid);
}

#[tokio::test]
async fn test_import_backfills_autocreated_row() {
    let (_dir, pool) = setup().await;

    // A predict call saw this label before the catalog was imported
    prediction::get_or_create_disease(&pool, "Potato___healthy")
        .await
        .unwrap();

    import_class(&pool, "Potato___healthy").await;

    let disease = prediction::get_disease_by_class(&pool, "Potato___healthy")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        disease.description,
        "Healthy Potato - healthy plant without signs of disease."
    );
    assert_eq!(disease.symptoms, "No symptoms of disease present.");
    assert!(disease.image_url.is_some());
}

#[tokio::test]
async fn test_import_populates_curated_fields() {
    let (_dir, pool) = setup().await;

    import_class(&pool, "Tomato___Late_blight").await;

    let disease = prediction::get_disease_by_class(&pool, "Tomato___Late_blight")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(disease.scientific_name.as_deref(), Some("Phytophthora infestans"));
    assert!(disease.description.contains("lesions"));
    assert!(disease.image_url.is_some());
}

#[tokio::test]
async fn test_sparse_upsert_preserves_curated_text() {
    let (_dir, pool) = setup().await;

    import_class(&pool, "Tomato___Late_blight").await;

    // Empty incoming values must not clobber the curated entry
    let disease = prediction::upsert_disease(
        &pool,
        "Tomato___Late_blight",
        None,
        "",
        "",
        "",
        "",
        None,
    )
    .await
    .unwrap();

    assert_eq!(disease.scientific_name.as_deref(), Some("Phytophthora infestans"));
    assert!(!disease.description.is_empty());
    assert!(disease.image_url.is_some());
}

#[tokio::test]
async fn test_import_idempotent() {
    let (_dir, pool) = setup().await;

    import_class(&pool, "Tomato___Late_blight").await;
    let first = prediction::get_disease_by_class(&pool, "Tomato___Late_blight")
        .await
        .unwrap()
        .unwrap();

    import_class(&pool, "Tomato___Late_blight").await;
    let second = prediction::get_disease_by_class(&pool, "Tomato___Late_blight")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.guid, second.guid);
    assert_eq!(first.description, second.description);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plant_diseases")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
