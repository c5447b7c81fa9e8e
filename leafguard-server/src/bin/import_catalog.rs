//! Catalog import utility
//!
//! Seeds the plant disease catalog from the exported model's label table:
//! one `plant_diseases` row per class, keyed on `class_name`, filled with
//! the curated per-class content (scientific name, description, symptoms,
//! treatment, prevention, reference image) or the generic default block.
//! Healthy classes get boilerplate derived from their display name.
//! Re-running is idempotent and refreshes the descriptive text of
//! existing rows.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leafguard_common::catalog;
use leafguard_common::config;
use leafguard_common::db::init_database;
use leafguard_server::catalog_info;
use leafguard_server::db::prediction;

/// Command-line arguments for import-catalog
#[derive(Parser, Debug)]
#[command(name = "import-catalog")]
#[command(about = "Seed the Leafguard disease catalog from the model's label table")]
#[command(version)]
struct Args {
    /// Data folder (database, media, model)
    #[arg(short, long, env = "LEAFGUARD_DATA")]
    data_folder: Option<String>,

    /// Model directory, overriding <data>/model
    #[arg(short, long, env = "LEAFGUARD_MODEL_DIR")]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leafguard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let data_folder = config::resolve_data_folder(args.data_folder.as_deref(), "LEAFGUARD_DATA")
        .context("Failed to resolve data folder")?;
    let model_dir = args
        .model_dir
        .unwrap_or_else(|| config::default_model_dir(&data_folder));

    let pool = init_database(&config::database_path(&data_folder))
        .await
        .context("Failed to initialize database")?;

    let metadata = catalog::load_from_model_dir(&model_dir);
    if metadata.classes.is_empty() {
        warn!(
            "No class metadata found in {}; nothing to import",
            model_dir.display()
        );
        return Ok(());
    }

    info!("Importing {} classes from {}", metadata.classes.len(), model_dir.display());

    let mut created = 0;
    let mut updated = 0;

    for class_name in metadata.classes.values() {
        let existed = prediction::get_disease_by_class(&pool, class_name)
            .await?
            .is_some();

        let entry = catalog_info::entry_for(class_name);
        prediction::upsert_disease(
            &pool,
            class_name,
            entry.scientific_name,
            &entry.description,
            &entry.symptoms,
            &entry.treatment,
            &entry.prevention,
            entry.image_url,
        )
        .await?;

        if existed {
            updated += 1;
        } else {
            created += 1;
        }
    }

    info!("Catalog import complete: {} created, {} updated", created, updated);
    Ok(())
}
