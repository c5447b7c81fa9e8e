//! ONNX Runtime session wrapper
//!
//! One session per process, opened at startup. Input/output names are
//! read from the model graph instead of being hardcoded.

use crate::error::{Error, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

pub struct OnnxSession {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxSession {
    pub fn open(model_path: &Path) -> Result<Self> {
        let session = Session::builder()
            .map_err(ort_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_error)?
            .with_intra_threads(2)
            .map_err(ort_error)?
            .commit_from_file(model_path)
            .map_err(ort_error)?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| Error::Inference("model has no inputs".to_string()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| Error::Inference("model has no outputs".to_string()))?;

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }

    /// Run one blocking inference over an NHWC float image batch of one
    pub fn run(&mut self, pixels: Vec<f32>, size: u32) -> Result<Vec<f32>> {
        let side = size as usize;
        let input = Tensor::from_array(([1, side, side, 3], pixels)).map_err(ort_error)?;

        let input_name = self.input_name.clone();
        let outputs = self
            .session
            .run(ort::inputs![input_name.as_str() => input])
            .map_err(ort_error)?;

        let (_, probabilities) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(ort_error)?;

        Ok(probabilities.to_vec())
    }
}

fn ort_error<T>(e: ort::Error<T>) -> Error {
    Error::Inference(e.to_string())
}
