//! HTTP server setup and routing

use crate::api;
use crate::fanout::RoomBus;
use crate::ml::DiseaseClassifier;
use crate::storage::MediaStore;
use crate::ws;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Upper bound for uploaded images (multipart bodies)
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Shared application state, injected into every handler
#[derive(Clone)]
pub struct AppContext {
    pub db_pool: SqlitePool,
    pub classifier: Arc<DiseaseClassifier>,
    pub bus: RoomBus,
    pub media: MediaStore,
}

/// Build the service router
pub fn create_router(context: AppContext) -> Router {
    let media_root = context.media.root().to_path_buf();

    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/refresh", post(api::auth::refresh))
        .route("/auth/me", get(api::auth::me))
        // Chat
        .route(
            "/chat/rooms",
            get(api::chat::list_rooms).post(api::chat::create_room),
        )
        .route("/chat/rooms/:room_guid/messages", get(api::chat::room_messages))
        .route("/chat/messages/upload_image", post(api::chat::upload_image))
        .route("/ws/chat/:room_guid", get(ws::chat_socket))
        // Prediction
        .route("/prediction/predict", post(api::prediction::predict))
        .route("/prediction/predictions", get(api::prediction::list_predictions))
        .route(
            "/prediction/predictions/recent",
            get(api::prediction::recent_predictions),
        )
        .route(
            "/prediction/predictions/sync_offline",
            post(api::prediction::sync_offline),
        )
        .route(
            "/prediction/diseases",
            get(api::prediction::list_diseases).post(api::prediction::create_disease),
        )
        .route(
            "/prediction/diseases/common",
            get(api::prediction::common_diseases),
        )
        .route("/prediction/diseases/:guid", get(api::prediction::get_disease))
        .route("/prediction/model-info", get(api::prediction::model_info))
        .route("/prediction/export-model", get(api::prediction::export_model))
        // Stored media (chat attachments, prediction images)
        .nest_service("/media", ServeDir::new(media_root))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(context)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
