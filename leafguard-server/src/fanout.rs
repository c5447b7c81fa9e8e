//! Per-room broadcast fan-out for realtime chat
//!
//! Every chat room maps to one `tokio::sync::broadcast` channel held in a
//! registry. Both ingress paths (websocket frames and the REST image
//! upload) publish the same `ChatEvent` shape, so all subscribers of a
//! room see one fan-out contract. Delivery is at-most-once best-effort:
//! no queue, no replay, no acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Explicit topic identifier, keyed by room guid
///
/// Rooms are addressed through this type and the `RoomBus` registry,
/// never by string-formatted group names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomTopic(String);

impl RoomTopic {
    pub fn for_room(room_guid: &str) -> Self {
        Self(room_guid.to_string())
    }

    pub fn room_guid(&self) -> &str {
        &self.0
    }
}

/// Event relayed to every connection subscribed to a room
///
/// Wire shape (server to client):
/// `{"type": "chat_message", "message", "username", "image_url", "created_at"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: String,
    pub username: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatEvent {
    pub fn chat_message(
        message: String,
        username: String,
        image_url: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type: "chat_message".to_string(),
            message,
            username,
            image_url,
            created_at,
        }
    }
}

/// Registry of per-room broadcast channels
///
/// Channels are created lazily on first subscribe or publish and kept for
/// the process lifetime (rooms are never deleted in normal operation).
#[derive(Clone)]
pub struct RoomBus {
    channels: Arc<Mutex<HashMap<RoomTopic, broadcast::Sender<ChatEvent>>>>,
    capacity: usize,
}

impl RoomBus {
    /// Create a new bus; `capacity` bounds the per-room event buffer
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    fn channel(&self, topic: &RoomTopic) -> broadcast::Sender<ChatEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Subscribe a connection to a room's topic
    pub fn subscribe(&self, topic: &RoomTopic) -> broadcast::Receiver<ChatEvent> {
        let rx = self.channel(topic).subscribe();
        debug!(
            "Subscribed to room {} ({} connections)",
            topic.room_guid(),
            self.subscriber_count(topic)
        );
        rx
    }

    /// Publish an event to every current subscriber of a room
    ///
    /// Returns the number of subscribers that received the event; zero
    /// when nobody is listening (not an error).
    pub fn publish(&self, topic: &RoomTopic, event: ChatEvent) -> usize {
        let delivered = self.channel(topic).send(event).unwrap_or(0);
        debug!("Published to room {}: {} subscribers", topic.room_guid(), delivered);
        delivered
    }

    /// Current number of subscribed connections for a room
    pub fn subscriber_count(&self, topic: &RoomTopic) -> usize {
        self.channel(topic).receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(msg: &str) -> ChatEvent {
        ChatEvent::chat_message(msg.to_string(), "grower".to_string(), None, Utc::now())
    }

    #[tokio::test]
    async fn test_all_room_subscribers_receive_event() {
        let bus = RoomBus::new(16);
        let topic = RoomTopic::for_room("room-a");

        let mut rx1 = bus.subscribe(&topic);
        let mut rx2 = bus.subscribe(&topic);

        let delivered = bus.publish(&topic, event("hello"));
        assert_eq!(delivered, 2);

        assert_eq!(rx1.recv().await.unwrap().message, "hello");
        assert_eq!(rx2.recv().await.unwrap().message, "hello");
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let bus = RoomBus::new(16);
        let topic_a = RoomTopic::for_room("room-a");
        let topic_b = RoomTopic::for_room("room-b");

        let mut rx_a = bus.subscribe(&topic_a);
        let mut rx_b = bus.subscribe(&topic_b);

        bus.publish(&topic_a, event("for room a only"));

        assert_eq!(rx_a.recv().await.unwrap().message, "for room a only");
        assert!(
            rx_b.try_recv().is_err(),
            "room b must not see room a's messages"
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_lossy() {
        let bus = RoomBus::new(16);
        let topic = RoomTopic::for_room("empty-room");

        assert_eq!(bus.publish(&topic, event("nobody home")), 0);
    }

    #[tokio::test]
    async fn test_unsubscribed_connection_misses_messages() {
        let bus = RoomBus::new(16);
        let topic = RoomTopic::for_room("room-a");

        let rx = bus.subscribe(&topic);
        drop(rx);

        assert_eq!(bus.publish(&topic, event("missed")), 0);

        // A later subscriber gets no backlog
        let mut rx2 = bus.subscribe(&topic);
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_event_wire_shape() {
        let json = serde_json::to_value(event("hi")).unwrap();
        assert_eq!(json["type"], "chat_message");
        assert_eq!(json["message"], "hi");
        assert_eq!(json["username"], "grower");
        assert!(json["image_url"].is_null());
        assert!(json["created_at"].is_string());
    }
}
