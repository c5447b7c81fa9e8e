//! Leafguard Server - Main entry point
//!
//! HTTP/websocket backend for the Leafguard plant-disease-identification
//! application: auth, community chat, and image-based disease prediction
//! backed by a pre-trained ONNX classifier.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leafguard_common::config;
use leafguard_common::db::init_database;
use leafguard_server::fanout::RoomBus;
use leafguard_server::ml::DiseaseClassifier;
use leafguard_server::storage::MediaStore;
use leafguard_server::{server, AppContext};

/// Command-line arguments for leafguard-server
#[derive(Parser, Debug)]
#[command(name = "leafguard-server")]
#[command(about = "Backend service for the Leafguard plant disease app")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "LEAFGUARD_PORT")]
    port: u16,

    /// Data folder (database, media, model)
    #[arg(short, long, env = "LEAFGUARD_DATA")]
    data_folder: Option<String>,

    /// Model directory, overriding <data>/model
    #[arg(short, long, env = "LEAFGUARD_MODEL_DIR")]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leafguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_folder = config::resolve_data_folder(args.data_folder.as_deref(), "LEAFGUARD_DATA")
        .context("Failed to resolve data folder")?;
    let model_dir = args
        .model_dir
        .unwrap_or_else(|| config::default_model_dir(&data_folder));

    info!("Starting Leafguard server on port {}", args.port);
    info!("Data folder: {}", data_folder.display());
    info!("Model directory: {}", model_dir.display());

    let db_pool = init_database(&config::database_path(&data_folder))
        .await
        .context("Failed to initialize database")?;

    let classifier = Arc::new(DiseaseClassifier::load(&model_dir));
    let media =
        MediaStore::new(data_folder.join("media")).context("Failed to initialize media store")?;

    let fanout_capacity = leafguard_server::db::settings::get_i64(
        &db_pool,
        "chat_fanout_capacity",
        100,
    )
    .await
    .context("Failed to read settings")? as usize;

    let context = AppContext {
        db_pool,
        classifier,
        bus: RoomBus::new(fanout_capacity),
        media,
    };

    let app = server::create_router(context);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
