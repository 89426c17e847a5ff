//! CLIP visual encoder session.
//!
//! Loads a CLIP image encoder exported to ONNX and runs inference to produce
//! image embeddings in the shared image/text space.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::{ModelError, PipelineError};

/// Output names that carry the projected image embedding, in preference order.
///
/// `image_embeds` is the HuggingFace/Optimum export; `features` is the name
/// used when exporting `model.visual` directly from the OpenAI package.
const IMAGE_OUTPUTS: &[&str] = &["image_embeds", "features"];

/// Wraps an ONNX Runtime session for CLIP image embedding.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct ClipVisionSession {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl ClipVisionSession {
    /// Load a CLIP visual encoder from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        let session = Session::builder()
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        let output_name =
            select_output(&output_names, IMAGE_OUTPUTS).ok_or_else(|| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!(
                    "No image embedding output found (expected one of {:?}, model has {:?})",
                    IMAGE_OUTPUTS, output_names
                ),
            })?;

        tracing::debug!(
            "Loaded CLIP visual encoder from {:?} (input: {:?}, output: {:?})",
            model_path,
            input_name,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Run inference on a preprocessed tensor and return the L2-normalized embedding.
    ///
    /// Input shape: \[1, 3, size, size\] (NCHW, CLIP-normalized).
    pub fn embed(&self, preprocessed: &Array4<f32>, path: &Path) -> Result<Vec<f32>, PipelineError> {
        let embedding_error = |message: String| PipelineError::Embedding {
            path: path.to_path_buf(),
            message,
        };

        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();
        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| embedding_error(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| embedding_error(format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| embedding_error(format!("ONNX inference failed: {e}")))?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .ok_or_else(|| embedding_error(format!("Model did not produce {}", self.output_name)))?;

        let (shape, data) = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| embedding_error(format!("Failed to extract image embedding: {e}")))?;

        // [1, D] for a single image.
        let mut raw = match shape.len() {
            1 => data.to_vec(),
            2 => data[..shape[1] as usize].to_vec(),
            _ => {
                return Err(embedding_error(format!(
                    "Unexpected image embedding shape: {:?}",
                    shape
                )))
            }
        };

        crate::math::l2_normalize_in_place(&mut raw);
        Ok(raw)
    }
}

/// Pick the embedding output: first preferred name present, else the only output.
pub(crate) fn select_output(available: &[String], preferred: &[&str]) -> Option<String> {
    preferred
        .iter()
        .find(|p| available.iter().any(|a| a == *p))
        .map(|p| p.to_string())
        .or_else(|| match available {
            [only] => Some(only.clone()),
            _ => None,
        })
}
