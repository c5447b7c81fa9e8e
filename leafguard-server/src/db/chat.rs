//! Chat room and message queries

use crate::error::{Error, Result};
use chrono::Utc;
use leafguard_common::db::models::{ChatMessage, ChatRoom};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn list_rooms(pool: &SqlitePool) -> Result<Vec<ChatRoom>> {
    let rooms = sqlx::query_as::<_, ChatRoom>("SELECT * FROM chat_rooms ORDER BY created_at")
        .fetch_all(pool)
        .await?;

    Ok(rooms)
}

pub async fn get_room(pool: &SqlitePool, room_guid: &str) -> Result<Option<ChatRoom>> {
    let room = sqlx::query_as::<_, ChatRoom>("SELECT * FROM chat_rooms WHERE guid = ?")
        .bind(room_guid)
        .fetch_optional(pool)
        .await?;

    Ok(room)
}

/// Create a room; room names are unique
pub async fn create_room(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
) -> Result<ChatRoom> {
    let guid = Uuid::new_v4().to_string();
    let created_at = Utc::now();

    let result = sqlx::query(
        "INSERT INTO chat_rooms (guid, name, description, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(name)
    .bind(description)
    .bind(created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(ChatRoom {
            guid,
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            created_at,
        }),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(Error::BadRequest("room name already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Persist one message and return it with the sender's username attached
pub async fn create_message(
    pool: &SqlitePool,
    room_guid: &str,
    user_guid: &str,
    content: &str,
    image_path: Option<&str>,
) -> Result<ChatMessage> {
    let guid = Uuid::new_v4().to_string();
    let created_at = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO chat_messages (guid, room_guid, user_guid, content, image_path, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(room_guid)
    .bind(user_guid)
    .bind(content)
    .bind(image_path)
    .bind(created_at)
    .execute(pool)
    .await?;

    let message = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT m.guid, m.room_guid, m.user_guid, u.username, m.content, m.image_path, m.created_at
        FROM chat_messages m
        JOIN users u ON u.guid = m.user_guid
        WHERE m.guid = ?
        "#,
    )
    .bind(&guid)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// Newest messages for a room, newest first; clients reorder for display
pub async fn recent_messages(
    pool: &SqlitePool,
    room_guid: &str,
    limit: i64,
) -> Result<Vec<ChatMessage>> {
    let messages = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT m.guid, m.room_guid, m.user_guid, u.username, m.content,
               m.image_path, m.created_at
        FROM chat_messages m
        JOIN users u ON u.guid = m.user_guid
        WHERE m.room_guid = ?
        ORDER BY m.created_at DESC, m.guid DESC
        LIMIT ?
        "#,
    )
    .bind(room_guid)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}
