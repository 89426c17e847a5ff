//! CLIP text encoder for label embeddings.
//!
//! Loads the CLIP text ONNX model and tokenizer and encodes label prompts to
//! vectors aligned with the visual encoder's space.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::clip::select_output;
use crate::error::ModelError;

/// Output names that carry the projected text embedding, in preference order.
const TEXT_OUTPUTS: &[&str] = &["text_embeds", "features"];

/// CLIP's end-of-text token, also used for padding.
const PAD_TOKEN: &str = "<|endoftext|>";

/// CLIP text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the visual encoder.
pub struct ClipTextEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    output_name: String,
    needs_attention_mask: bool,
}

impl ClipTextEncoder {
    /// Load the text encoder and tokenizer.
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        max_tokens: usize,
    ) -> Result<Self, ModelError> {
        let session = Session::builder()
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!("Failed to load text encoder model: {e}"),
            })?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| ModelError::Load {
            path: tokenizer_path.to_path_buf(),
            message: format!("Failed to load tokenizer: {e}"),
        })?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| ModelError::Load {
                path: tokenizer_path.to_path_buf(),
                message: format!("Failed to configure truncation: {e}"),
            })?;

        // Pad a batch to its longest prompt. Padding with the end-of-text
        // token keeps CLIP's argmax-based pooling on the first EOT.
        let padding = match tokenizer.get_padding() {
            Some(existing) => PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..existing.clone()
            },
            None => PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                pad_id: tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0),
                pad_token: PAD_TOKEN.to_string(),
                ..Default::default()
            },
        };
        tokenizer.with_padding(Some(padding));

        let input_names: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let needs_attention_mask = input_names.iter().any(|n| n == "attention_mask");

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        let output_name =
            select_output(&output_names, TEXT_OUTPUTS).ok_or_else(|| ModelError::Load {
                path: model_path.to_path_buf(),
                message: format!(
                    "No text embedding output found (expected one of {:?}, model has {:?})",
                    TEXT_OUTPUTS, output_names
                ),
            })?;

        tracing::debug!(
            "Loaded CLIP text encoder (inputs: {:?}, output: {:?})",
            input_names,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            output_name,
            needs_attention_mask,
        })
    }

    /// Encode a batch of prompts to L2-normalized embeddings, one per prompt.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::Inference {
                message: format!("Tokenization failed: {e}"),
            })?;

        let seq_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        for (i, encoding) in encodings.iter().enumerate() {
            let row = i * seq_len;
            for (j, (&id, &mask)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .enumerate()
            {
                input_ids[row + j] = id as i64;
                attention_mask[row + j] = mask as i64;
            }
        }

        let shape = vec![batch_size as i64, seq_len as i64];
        let tensor_error = |e: ort::Error| ModelError::Inference {
            message: format!("Failed to create input tensor: {e}"),
        };
        let ids_value = Value::from_array((shape.clone(), input_ids)).map_err(tensor_error)?;

        let mut session = self.session.lock().map_err(|e| ModelError::Inference {
            message: format!("Text encoder lock poisoned: {e}"),
        })?;

        let run_result = if self.needs_attention_mask {
            let mask_value = Value::from_array((shape, attention_mask)).map_err(tensor_error)?;
            session.run(ort::inputs![
                "input_ids" => ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => ids_value])
        };
        let outputs = run_result.map_err(|e| ModelError::Inference {
            message: format!("Text encoder inference failed: {e}"),
        })?;

        let output = outputs
            .iter()
            .find(|(name, _)| *name == self.output_name)
            .ok_or_else(|| ModelError::Inference {
                message: format!("Text encoder did not produce {}", self.output_name),
            })?;

        let (shape, data) = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference {
                message: format!("Failed to extract text embedding: {e}"),
            })?;

        let dim = batch_embedding_dim(shape).ok_or_else(|| ModelError::Inference {
            message: format!("Unexpected text embedding shape: {:?}", shape),
        })?;

        let embeddings: Vec<Vec<f32>> = data
            .chunks(dim)
            .take(batch_size)
            .map(crate::math::l2_normalize)
            .collect();

        if embeddings.len() != batch_size {
            return Err(ModelError::Inference {
                message: format!(
                    "Text encoder returned {} embeddings for {} prompts",
                    embeddings.len(),
                    batch_size
                ),
            });
        }

        Ok(embeddings)
    }
}

/// Embedding width of a `[N, D]` output; `None` for any other shape or `D == 0`.
fn batch_embedding_dim(shape: &[i64]) -> Option<usize> {
    match shape {
        [_, dim] if *dim > 0 => usize::try_from(*dim).ok(),
        _ => None,
    }
}
