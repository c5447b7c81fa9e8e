//! Classifier catalog metadata
//!
//! The trained classifier ships with a JSON metadata file describing its
//! label space, plus an older plain-text `index,name` mapping file kept as
//! a fallback. Both are canonicalized into one `{index -> class name}`
//! table at load time; nothing downstream ever sees the duck-typed JSON
//! shape.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Default model input dimension when metadata omits `image_size`
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// File name of the JSON metadata next to the model file
pub const METADATA_FILE: &str = "model_metadata.json";

/// File name of the fallback plain-text class mapping
pub const CLASS_MAPPING_FILE: &str = "class_mapping.txt";

/// Raw metadata as stored on disk
///
/// `classes` appears in the wild both as `{ "0": "name" }` and as a bare
/// `["name", ...]` list; the untagged enum absorbs either shape.
#[derive(Debug, Deserialize)]
pub struct RawMetadata {
    pub model_version: Option<String>,
    pub image_size: Option<u32>,
    pub class_count: Option<usize>,
    pub classes: Option<ClassesField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ClassesField {
    /// `{ "0": "Tomato___Late_blight", ... }`
    Indexed(BTreeMap<String, String>),
    /// `["Pepper__healthy", "Tomato___Late_blight", ...]`
    Ordered(Vec<String>),
}

/// Canonical catalog metadata: one `{index -> class name}` table
#[derive(Debug, Clone)]
pub struct CatalogMetadata {
    pub model_version: Option<String>,
    pub image_size: u32,
    pub classes: BTreeMap<i64, String>,
}

impl ClassesField {
    fn into_table(self) -> Result<BTreeMap<i64, String>> {
        match self {
            ClassesField::Indexed(map) => {
                let mut table = BTreeMap::new();
                for (key, name) in map {
                    let index: i64 = key.parse().map_err(|_| {
                        Error::Catalog(format!("non-numeric class index: {:?}", key))
                    })?;
                    table.insert(index, name);
                }
                Ok(table)
            }
            ClassesField::Ordered(list) => Ok(list
                .into_iter()
                .enumerate()
                .map(|(i, name)| (i as i64, name))
                .collect()),
        }
    }
}

/// Load and canonicalize the JSON metadata file
pub fn load_metadata(path: &Path) -> Result<CatalogMetadata> {
    let content = std::fs::read_to_string(path)?;
    let raw: RawMetadata = serde_json::from_str(&content)
        .map_err(|e| Error::Catalog(format!("invalid metadata JSON: {}", e)))?;

    let classes = match raw.classes {
        Some(field) => field.into_table()?,
        None => BTreeMap::new(),
    };

    Ok(CatalogMetadata {
        model_version: raw.model_version,
        image_size: raw.image_size.unwrap_or(DEFAULT_IMAGE_SIZE),
        classes,
    })
}

/// Load the fallback plain-text mapping (`index,name` per line)
///
/// Class names may themselves contain commas, so only the first comma
/// separates index from name. Blank and malformed lines are skipped.
pub fn load_class_mapping(path: &Path) -> Result<BTreeMap<i64, String>> {
    let content = std::fs::read_to_string(path)?;
    let mut table = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((index, name)) = line.split_once(',') {
            if let Ok(index) = index.trim().parse::<i64>() {
                table.insert(index, name.to_string());
            }
        }
    }

    Ok(table)
}

/// Load the class table from a model directory: JSON metadata first, then
/// the plain-text fallback, then an empty table
pub fn load_from_model_dir(model_dir: &Path) -> CatalogMetadata {
    let metadata_path = model_dir.join(METADATA_FILE);
    if metadata_path.exists() {
        match load_metadata(&metadata_path) {
            Ok(meta) => return meta,
            Err(e) => tracing::warn!("Failed to load {}: {}", metadata_path.display(), e),
        }
    }

    let mapping_path = model_dir.join(CLASS_MAPPING_FILE);
    if mapping_path.exists() {
        match load_class_mapping(&mapping_path) {
            Ok(classes) => {
                return CatalogMetadata {
                    model_version: None,
                    image_size: DEFAULT_IMAGE_SIZE,
                    classes,
                }
            }
            Err(e) => tracing::warn!("Failed to load {}: {}", mapping_path.display(), e),
        }
    }

    CatalogMetadata {
        model_version: None,
        image_size: DEFAULT_IMAGE_SIZE,
        classes: BTreeMap::new(),
    }
}

/// Resolve a class index to its label; unmapped indices get a
/// deterministic placeholder name
pub fn label_for(classes: &BTreeMap<i64, String>, index: i64) -> String {
    classes
        .get(&index)
        .cloned()
        .unwrap_or_else(|| format!("Unknown_Class_{}", index))
}

/// Derive the human-readable display name from a classifier class name
///
/// `"Tomato___Late_blight"` becomes `"Tomato - Late blight"`. The display
/// name is presentation only; `class_name` remains the lookup key.
pub fn display_name(class_name: &str) -> String {
    class_name.replace("___", " - ").replace('_', " ")
}

/// Whether a class represents a healthy plant rather than a disease
pub fn is_healthy_class(class_name: &str) -> bool {
    class_name.to_lowercase().contains("healthy")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_transform() {
        assert_eq!(display_name("Tomato___Late_blight"), "Tomato - Late blight");
        assert_eq!(display_name("Potato___healthy"), "Potato - healthy");
        assert_eq!(display_name("Pepper,_bell___Bacterial_spot"), "Pepper, bell - Bacterial spot");
    }

    #[test]
    fn test_classes_as_map() {
        let raw: RawMetadata = serde_json::from_str(
            r#"{"model_version": "1.0", "image_size": 224, "class_count": 2,
                "classes": {"1": "Potato___Early_blight", "0": "Potato___healthy"}}"#,
        )
        .unwrap();
        let table = raw.classes.unwrap().into_table().unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table[&0], "Potato___healthy");
        assert_eq!(table[&1], "Potato___Early_blight");
    }

    #[test]
    fn test_classes_as_list() {
        let raw: RawMetadata =
            serde_json::from_str(r#"{"classes": ["A___x", "B___y"]}"#).unwrap();
        let table = raw.classes.unwrap().into_table().unwrap();

        assert_eq!(table[&0], "A___x");
        assert_eq!(table[&1], "B___y");
    }

    #[test]
    fn test_non_numeric_index_rejected() {
        let raw: RawMetadata =
            serde_json::from_str(r#"{"classes": {"zero": "A"}}"#).unwrap();
        assert!(raw.classes.unwrap().into_table().is_err());
    }

    #[test]
    fn test_class_mapping_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CLASS_MAPPING_FILE);
        std::fs::write(&path, "0,Potato___healthy\n1,Pepper,_bell___Bacterial_spot\n\nbad line\n")
            .unwrap();

        let table = load_class_mapping(&path).unwrap();
        assert_eq!(table.len(), 2);
        // Only the first comma splits index from name
        assert_eq!(table[&1], "Pepper,_bell___Bacterial_spot");
    }

    #[test]
    fn test_label_for_unknown_index() {
        let table = BTreeMap::new();
        assert_eq!(label_for(&table, 7), "Unknown_Class_7");
    }

    #[test]
    fn test_healthy_detection() {
        assert!(is_healthy_class("Potato___healthy"));
        assert!(!is_healthy_class("Potato___Early_blight"));
    }

    #[test]
    fn test_load_from_missing_dir_is_empty() {
        let meta = load_from_model_dir(Path::new("/nonexistent/leafguard-model"));
        assert!(meta.classes.is_empty());
        assert_eq!(meta.image_size, DEFAULT_IMAGE_SIZE);
    }
}
