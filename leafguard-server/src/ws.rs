//! Realtime chat websocket
//!
//! One connection per room. Joining subscribes to the room's broadcast
//! topic with no history push; incoming `message` frames are persisted
//! first, then published so every subscriber (the sender included) sees
//! the event. Disconnect drops the subscription.

use crate::db::{chat, users};
use crate::error::{Error, Result};
use crate::fanout::{ChatEvent, RoomTopic};
use crate::server::AppContext;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

/// Frame sent by clients over the socket
#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(rename = "type")]
    frame_type: String,
    message: Option<String>,
    username: Option<String>,
    image_url: Option<String>,
}

/// GET /ws/chat/{room_guid}
pub async fn chat_socket(
    ws: WebSocketUpgrade,
    Path(room_guid): Path<String>,
    State(context): State<AppContext>,
) -> Result<Response> {
    // Reject unknown rooms before the upgrade completes
    let room = chat::get_room(&context.db_pool, &room_guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no chat room {}", room_guid)))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, context, room.guid)))
}

async fn handle_socket(socket: WebSocket, context: AppContext, room_guid: String) {
    let topic = RoomTopic::for_room(&room_guid);
    let mut events = context.bus.subscribe(&topic);

    let (mut sink, mut stream) = socket.split();

    // Relay room events out to this connection
    let mut send_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize chat event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Persist and publish frames coming in from this connection
    let recv_context = context.clone();
    let recv_room = room_guid.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => {
                    if let Err(e) = handle_frame(&recv_context, &recv_room, &text).await {
                        warn!("Dropped chat frame in room {}: {}", recv_room, e);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Either half ending tears down the whole connection
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    debug!("Connection left room {}", room_guid);
}

async fn handle_frame(context: &AppContext, room_guid: &str, text: &str) -> Result<()> {
    let frame: ClientFrame = serde_json::from_str(text)
        .map_err(|e| Error::BadRequest(format!("unparseable frame: {}", e)))?;

    if frame.frame_type != "message" {
        debug!("Ignoring frame type {:?}", frame.frame_type);
        return Ok(());
    }

    let username = frame
        .username
        .ok_or_else(|| Error::BadRequest("frame missing username".to_string()))?;
    let content = frame.message.unwrap_or_default();

    let user = users::get_user_by_username(&context.db_pool, &username)
        .await?
        .ok_or_else(|| Error::BadRequest(format!("unknown user {}", username)))?;

    // Attachment URLs come from the REST upload path; store the relative
    // media path alongside the message
    let image_path = frame
        .image_url
        .as_deref()
        .map(|url| url.strip_prefix("/media/").unwrap_or(url).to_string());

    let message = chat::create_message(
        &context.db_pool,
        room_guid,
        &user.guid,
        &content,
        image_path.as_deref(),
    )
    .await?;

    context.bus.publish(
        &RoomTopic::for_room(room_guid),
        ChatEvent::chat_message(
            message.content,
            message.username,
            frame.image_url,
            message.created_at,
        ),
    );

    Ok(())
}
