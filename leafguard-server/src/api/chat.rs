//! Community chat REST endpoints
//!
//! The websocket path in `crate::ws` handles realtime traffic; these
//! handlers cover room management, history, and the image-attachment
//! upload. The upload publishes the same `ChatEvent` shape the websocket
//! path does, so subscribers see one fan-out contract.

use crate::api::auth::CurrentUser;
use crate::db::{chat, settings};
use crate::error::{Error, Result};
use crate::fanout::{ChatEvent, RoomTopic};
use crate::server::AppContext;
use crate::storage::MediaStore;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use leafguard_common::db::models::{ChatMessage, ChatRoom};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub description: Option<String>,
}

/// A chat message plus its attachment URL, as returned to clients
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub image_url: Option<String>,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        let image_url = message.image_path.as_deref().map(MediaStore::url_for);
        Self { message, image_url }
    }
}

/// GET /chat/rooms
pub async fn list_rooms(State(context): State<AppContext>) -> Result<Json<Vec<ChatRoom>>> {
    Ok(Json(chat::list_rooms(&context.db_pool).await?))
}

/// POST /chat/rooms
pub async fn create_room(
    State(context): State<AppContext>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ChatRoom>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest("room name must not be empty".to_string()));
    }

    let room = chat::create_room(&context.db_pool, name, request.description.as_deref()).await?;
    info!("User {} created room {}", user.username, room.name);

    Ok((StatusCode::CREATED, Json(room)))
}

/// GET /chat/rooms/{room_guid}/messages
///
/// Returns the newest page (default 100, settings-backed) newest first.
pub async fn room_messages(
    State(context): State<AppContext>,
    CurrentUser(_user): CurrentUser,
    Path(room_guid): Path<String>,
) -> Result<Json<Vec<MessageResponse>>> {
    chat::get_room(&context.db_pool, &room_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no chat room {}", room_guid)))?;

    let page_size = settings::get_i64(&context.db_pool, "chat_history_page_size", 100).await?;
    let messages = chat::recent_messages(&context.db_pool, &room_guid, page_size).await?;

    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// POST /chat/messages/upload_image (multipart: room, image, content?)
///
/// Persists the message first, then publishes to the room's topic.
pub async fn upload_image(
    State(context): State<AppContext>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let mut room_guid: Option<String> = None;
    let mut content = String::new();
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("invalid multipart payload: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "room" => {
                room_guid = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| Error::BadRequest(e.to_string()))?,
                );
            }
            "content" => {
                content = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(e.to_string()))?;
            }
            "image" => {
                let file_name = field.file_name().unwrap_or("upload.jpg").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest(e.to_string()))?;
                image = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let room_guid =
        room_guid.ok_or_else(|| Error::BadRequest("missing room field".to_string()))?;
    let (file_name, bytes) =
        image.ok_or_else(|| Error::BadRequest("missing image field".to_string()))?;

    chat::get_room(&context.db_pool, &room_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no chat room {}", room_guid)))?;

    let relative = context
        .media
        .save_chat_attachment(&room_guid, &file_name, &bytes)?;

    let message = match chat::create_message(
        &context.db_pool,
        &room_guid,
        &user.guid,
        &content,
        Some(&relative),
    )
    .await
    {
        Ok(message) => message,
        Err(e) => {
            context.media.remove(&relative);
            return Err(e);
        }
    };

    let response = MessageResponse::from(message);
    context.bus.publish(
        &RoomTopic::for_room(&room_guid),
        ChatEvent::chat_message(
            response.message.content.clone(),
            response.message.username.clone(),
            response.image_url.clone(),
            response.message.created_at,
        ),
    );

    Ok((StatusCode::CREATED, Json(response)))
}
