//! Media file storage
//!
//! Chat attachments and prediction images are written beneath one media
//! root with uuid-based file names; stored paths are relative to that
//! root and served by the static file layer under `/media`.

use crate::error::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory name for chat attachments under the media root
const CHAT_ATTACHMENTS: &str = "chat_attachments";

/// Directory name for prediction images under the media root
const PREDICTION_IMAGES: &str = "prediction_images";

#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a stored relative path
    pub fn url_for(relative: &str) -> String {
        format!("/media/{}", relative)
    }

    /// Store a chat attachment; returns the relative path
    /// `chat_attachments/{room}/{uuid}.{ext}`
    pub fn save_chat_attachment(
        &self,
        room_guid: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let ext = sanitized_extension(original_name);
        let relative = format!(
            "{}/{}/{}.{}",
            CHAT_ATTACHMENTS,
            room_guid,
            Uuid::new_v4().simple(),
            ext
        );
        self.write(&relative, bytes)?;
        Ok(relative)
    }

    /// Store a prediction image; offline-synced images get a marker prefix
    pub fn save_prediction_image(&self, bytes: &[u8], offline: bool) -> Result<String> {
        let prefix = if offline { "offline_" } else { "" };
        let relative = format!("{}/{}{}.jpg", PREDICTION_IMAGES, prefix, Uuid::new_v4());
        self.write(&relative, bytes)?;
        Ok(relative)
    }

    /// Best-effort removal, used to clean up when a later insert fails
    pub fn remove(&self, relative: &str) {
        let _ = std::fs::remove_file(self.root.join(relative));
    }

    fn write(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Lowercased alphanumeric extension from the uploaded file name,
/// defaulting to jpg
fn sanitized_extension(original_name: &str) -> String {
    let ext = original_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        ext
    } else {
        "jpg".to_string()
    }
}
