//! Disease classifier inference adapter
//!
//! Wraps the pre-trained ONNX image classifier behind a small, explicitly
//! constructed service object. The adapter is built once at startup and
//! shared read-only via `Arc`; a missing model or metadata file puts it in
//! an unavailable state in which predictions return an empty list rather
//! than erroring (an absent model is an expected deployment condition).
//!
//! Inference is a single blocking session run guarded by a mutex:
//! concurrent prediction requests serialize, with no queueing, timeout,
//! or cancellation at this layer.

#[cfg(feature = "onnx")]
mod onnx;

use crate::error::{Error, Result};
use leafguard_common::catalog::{self, CatalogMetadata};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[cfg(feature = "onnx")]
use std::sync::Mutex;

/// File name of the exported model next to its metadata
pub const MODEL_FILE: &str = "plant_disease_model.onnx";

/// One ranked prediction
#[derive(Debug, Clone, Serialize)]
pub struct Scored {
    pub label: String,
    pub confidence: f32,
}

/// Adapter status for `/prediction/model-info`
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierInfo {
    pub status: String,
    pub classes: usize,
    pub image_size: u32,
    pub model_version: Option<String>,
}

/// Loaded classifier plus its canonical label table
pub struct DiseaseClassifier {
    classes: BTreeMap<i64, String>,
    image_size: u32,
    model_version: Option<String>,
    model_path: PathBuf,
    #[cfg(feature = "onnx")]
    session: Option<Mutex<onnx::OnnxSession>>,
}

impl DiseaseClassifier {
    /// Load the model and its metadata from `model_dir`
    ///
    /// Never fails the process: load problems are logged and leave the
    /// adapter unavailable.
    pub fn load(model_dir: &Path) -> Self {
        let CatalogMetadata {
            model_version,
            image_size,
            classes,
        } = catalog::load_from_model_dir(model_dir);

        let model_path = model_dir.join(MODEL_FILE);

        #[cfg(feature = "onnx")]
        let session = if model_path.exists() {
            match onnx::OnnxSession::open(&model_path) {
                Ok(session) => {
                    info!(
                        "Model loaded from {} ({} classes, input {}x{})",
                        model_path.display(),
                        classes.len(),
                        image_size,
                        image_size
                    );
                    Some(Mutex::new(session))
                }
                Err(e) => {
                    warn!("Failed to load model {}: {}", model_path.display(), e);
                    None
                }
            }
        } else {
            warn!("Model file not found at {}", model_path.display());
            None
        };

        #[cfg(not(feature = "onnx"))]
        warn!("Built without the onnx feature; classifier is unavailable");

        Self {
            classes,
            image_size,
            model_version,
            model_path,
            #[cfg(feature = "onnx")]
            session,
        }
    }

    /// Whether a model is loaded and ready for inference
    pub fn is_loaded(&self) -> bool {
        #[cfg(feature = "onnx")]
        return self.session.is_some();
        #[cfg(not(feature = "onnx"))]
        false
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            status: if self.is_loaded() { "loaded" } else { "not_loaded" }.to_string(),
            classes: self.classes.len(),
            image_size: self.image_size,
            model_version: self.model_version.clone(),
        }
    }

    /// Run inference and return the top-k `(label, confidence)` pairs,
    /// sorted descending by confidence with ties broken by class index
    ///
    /// An unavailable adapter returns an empty list. An undecodable image
    /// is a client error.
    pub fn predict_top_k(&self, image_bytes: &[u8], k: usize) -> Result<Vec<Scored>> {
        #[cfg(feature = "onnx")]
        if let Some(session) = &self.session {
            let pixels = preprocess(image_bytes, self.image_size)?;
            let probabilities = session
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .run(pixels, self.image_size)?;
            return Ok(top_k(&probabilities, &self.classes, k));
        }

        let _ = image_bytes;
        let _ = k;
        Ok(Vec::new())
    }
}

/// Decode, force RGB, resize to the model's square input, scale to [0,1]
///
/// Output is NHWC with the leading batch dimension implied by the caller
/// (one flat `size * size * 3` buffer per call).
fn preprocess(image_bytes: &[u8], size: u32) -> Result<Vec<f32>> {
    let decoded = image::load_from_memory(image_bytes)
        .map_err(|e| Error::BadRequest(format!("could not decode image: {}", e)))?;

    let rgb = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, image::imageops::FilterType::Triangle);

    let mut pixels = Vec::with_capacity((size * size * 3) as usize);
    for pixel in resized.pixels() {
        for channel in pixel.0 {
            pixels.push(channel as f32 / 255.0);
        }
    }

    Ok(pixels)
}

/// Select the k highest probabilities, descending, index order on ties
fn top_k(probabilities: &[f32], classes: &BTreeMap<i64, String>, k: usize) -> Vec<Scored> {
    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    // Stable sort keeps ascending index order among equal confidences
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    indexed
        .into_iter()
        .take(k)
        .map(|(index, confidence)| Scored {
            label: catalog::label_for(classes, index as i64),
            confidence,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes() -> BTreeMap<i64, String> {
        [
            (0, "Potato___healthy".to_string()),
            (1, "Potato___Early_blight".to_string()),
            (2, "Tomato___Late_blight".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 200, 40]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_top_k_sorted_descending() {
        let results = top_k(&[0.1, 0.7, 0.2], &classes(), 3);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].label, "Potato___Early_blight");
        assert_eq!(results[1].label, "Tomato___Late_blight");
        assert_eq!(results[2].label, "Potato___healthy");
        assert!(results.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn test_top_k_limits_to_k() {
        assert_eq!(top_k(&[0.1, 0.7, 0.2], &classes(), 2).len(), 2);
        // k larger than the class count returns everything
        assert_eq!(top_k(&[0.1, 0.7, 0.2], &classes(), 10).len(), 3);
    }

    #[test]
    fn test_top_k_ties_broken_by_index() {
        let results = top_k(&[0.4, 0.4, 0.2], &classes(), 2);

        assert_eq!(results[0].label, "Potato___healthy");
        assert_eq!(results[1].label, "Potato___Early_blight");
    }

    #[test]
    fn test_top_k_unmapped_index() {
        let results = top_k(&[0.9], &BTreeMap::new(), 1);
        assert_eq!(results[0].label, "Unknown_Class_0");
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let pixels = preprocess(&png_bytes(31, 17), 224).unwrap();

        assert_eq!(pixels.len(), 224 * 224 * 3);
        assert!(pixels.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_preprocess_rejects_garbage() {
        assert!(matches!(
            preprocess(b"not an image", 224),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_unavailable_classifier_returns_empty() {
        let classifier = DiseaseClassifier::load(Path::new("/nonexistent/model-dir"));

        assert!(!classifier.is_loaded());
        assert_eq!(classifier.info().status, "not_loaded");

        let results = classifier.predict_top_k(&png_bytes(8, 8), 3).unwrap();
        assert!(results.is_empty());
    }
}
