//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub guid: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub token_hash: String,
    pub refresh_hash: String,
    pub user_guid: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatRoom {
    pub guid: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub guid: String,
    pub room_guid: String,
    pub user_guid: String,
    pub username: String,
    pub content: String,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlantDisease {
    pub guid: String,
    /// Unique key into the classifier's label space
    pub class_name: String,
    /// Display name derived from `class_name`; presentation only
    pub name: String,
    pub scientific_name: Option<String>,
    pub description: String,
    pub symptoms: String,
    pub treatment: String,
    pub prevention: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Prediction {
    pub guid: String,
    pub user_guid: String,
    pub disease_guid: String,
    pub image_path: String,
    /// Always within [0, 1]; enforced by a table CHECK
    pub confidence_score: f64,
    pub is_offline: bool,
    pub created_at: DateTime<Utc>,
}
