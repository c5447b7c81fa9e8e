//! Disease catalog and prediction history queries

use crate::error::Result;
use chrono::{DateTime, Utc};
use leafguard_common::catalog;
use leafguard_common::db::models::PlantDisease;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

/// A stored prediction joined with its catalog entry, as returned by the
/// history endpoints
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PredictionRecord {
    pub guid: String,
    pub disease_guid: String,
    pub disease_name: String,
    pub class_name: String,
    pub image_path: String,
    pub confidence_score: f64,
    pub is_offline: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregate row for the most-predicted diseases
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DiseaseFrequency {
    pub disease_guid: String,
    pub name: String,
    pub class_name: String,
    pub prediction_count: i64,
}

pub async fn list_diseases(pool: &SqlitePool) -> Result<Vec<PlantDisease>> {
    let diseases = sqlx::query_as::<_, PlantDisease>("SELECT * FROM plant_diseases ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(diseases)
}

pub async fn get_disease(pool: &SqlitePool, guid: &str) -> Result<Option<PlantDisease>> {
    let disease = sqlx::query_as::<_, PlantDisease>("SELECT * FROM plant_diseases WHERE guid = ?")
        .bind(guid)
        .fetch_optional(pool)
        .await?;

    Ok(disease)
}

pub async fn get_disease_by_class(
    pool: &SqlitePool,
    class_name: &str,
) -> Result<Option<PlantDisease>> {
    let disease =
        sqlx::query_as::<_, PlantDisease>("SELECT * FROM plant_diseases WHERE class_name = ?")
            .bind(class_name)
            .fetch_optional(pool)
            .await?;

    Ok(disease)
}

/// Text used for diseases created on the fly from a classifier label
pub const AUTO_CREATED_TEXT: &str = "Information not available yet";

/// Insert or update a catalog entry keyed on its class name
///
/// On conflict the descriptive columns are overwritten by non-empty
/// incoming values; empty values leave the existing text alone, so
/// curated entries survive a sparse update.
pub async fn upsert_disease(
    pool: &SqlitePool,
    class_name: &str,
    scientific_name: Option<&str>,
    description: &str,
    symptoms: &str,
    treatment: &str,
    prevention: &str,
    image_url: Option<&str>,
) -> Result<PlantDisease> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO plant_diseases
            (guid, class_name, name, scientific_name, description, symptoms,
             treatment, prevention, image_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(class_name) DO UPDATE SET
            name = excluded.name,
            scientific_name = COALESCE(excluded.scientific_name, scientific_name),
            description = CASE WHEN excluded.description = ''
                THEN description ELSE excluded.description END,
            symptoms = CASE WHEN excluded.symptoms = ''
                THEN symptoms ELSE excluded.symptoms END,
            treatment = CASE WHEN excluded.treatment = ''
                THEN treatment ELSE excluded.treatment END,
            prevention = CASE WHEN excluded.prevention = ''
                THEN prevention ELSE excluded.prevention END,
            image_url = COALESCE(excluded.image_url, image_url),
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(class_name)
    .bind(catalog::display_name(class_name))
    .bind(scientific_name)
    .bind(description)
    .bind(symptoms)
    .bind(treatment)
    .bind(prevention)
    .bind(image_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let disease = sqlx::query_as::<_, PlantDisease>(
        "SELECT * FROM plant_diseases WHERE class_name = ?",
    )
    .bind(class_name)
    .fetch_one(pool)
    .await?;

    Ok(disease)
}

/// Resolve a classifier label to a catalog entry, creating one on the
/// fly with placeholder text for labels the import step has not seen
pub async fn get_or_create_disease(pool: &SqlitePool, class_name: &str) -> Result<PlantDisease> {
    if let Some(disease) = get_disease_by_class(pool, class_name).await? {
        return Ok(disease);
    }

    upsert_disease(
        pool,
        class_name,
        None,
        AUTO_CREATED_TEXT,
        AUTO_CREATED_TEXT,
        AUTO_CREATED_TEXT,
        AUTO_CREATED_TEXT,
        None,
    )
    .await
}

/// Record one prediction; caller has already stored the image
///
/// `created_at` lets offline sync keep the client's capture time;
/// `None` means now.
pub async fn create_prediction(
    pool: &SqlitePool,
    user_guid: &str,
    disease_guid: &str,
    image_path: &str,
    confidence_score: f64,
    is_offline: bool,
    created_at: Option<DateTime<Utc>>,
) -> Result<PredictionRecord> {
    let guid = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO predictions
            (guid, user_guid, disease_guid, image_path, confidence_score, is_offline, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(user_guid)
    .bind(disease_guid)
    .bind(image_path)
    .bind(confidence_score)
    .bind(is_offline)
    .bind(created_at.unwrap_or_else(Utc::now))
    .execute(pool)
    .await?;

    let record = sqlx::query_as::<_, PredictionRecord>(
        r#"
        SELECT p.guid, p.disease_guid, d.name AS disease_name, d.class_name,
               p.image_path, p.confidence_score, p.is_offline, p.created_at
        FROM predictions p
        JOIN plant_diseases d ON d.guid = p.disease_guid
        WHERE p.guid = ?
        "#,
    )
    .bind(&guid)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// A user's prediction history, newest first
pub async fn user_predictions(
    pool: &SqlitePool,
    user_guid: &str,
    limit: Option<i64>,
) -> Result<Vec<PredictionRecord>> {
    // -1 disables the LIMIT clause in SQLite
    let records = sqlx::query_as::<_, PredictionRecord>(
        r#"
        SELECT p.guid, p.disease_guid, d.name AS disease_name, d.class_name,
               p.image_path, p.confidence_score, p.is_offline, p.created_at
        FROM predictions p
        JOIN plant_diseases d ON d.guid = p.disease_guid
        WHERE p.user_guid = ?
        ORDER BY p.created_at DESC, p.guid DESC
        LIMIT ?
        "#,
    )
    .bind(user_guid)
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Diseases ranked by how often they have been predicted, across users
pub async fn common_diseases(pool: &SqlitePool, limit: i64) -> Result<Vec<DiseaseFrequency>> {
    let rows = sqlx::query_as::<_, DiseaseFrequency>(
        r#"
        SELECT d.guid AS disease_guid, d.name, d.class_name,
               COUNT(p.guid) AS prediction_count
        FROM plant_diseases d
        JOIN predictions p ON p.disease_guid = d.guid
        GROUP BY d.guid
        ORDER BY prediction_count DESC, d.name ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
