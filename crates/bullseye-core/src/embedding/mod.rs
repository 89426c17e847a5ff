//! CLIP embedding generation for images and labels.
//!
//! Both encoders run locally via ONNX Runtime and produce L2-normalized
//! vectors in one shared space, so a dot product is a cosine similarity.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bullseye_core::embedding::{Embedder, EmbeddingEngine};
//! use bullseye_core::Config;
//!
//! let config = Config::default();
//! let engine = EmbeddingEngine::load(&config)?;
//! let image_vec = engine.embed_image(&std::fs::read("cat.jpg")?, "cat.jpg".as_ref())?;
//! let label_vec = engine.embed_text("cats")?;
//! ```

pub(crate) mod clip;
pub mod preprocess;
pub(crate) mod text_encoder;

use std::path::{Path, PathBuf};

use crate::config::{Config, EmbeddingConfig};
use crate::error::{ModelError, PipelineResult};
use crate::pipeline::decode::ImageDecoder;

use self::clip::ClipVisionSession;
use self::preprocess::preprocess;
use self::text_encoder::ClipTextEncoder;

/// The visual encoder ONNX model filename.
const VISUAL_MODEL_FILENAME: &str = "visual.onnx";

/// The text encoder ONNX model filename.
const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// The tokenizer filename.
const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Anything that can place images and labels in one embedding space.
///
/// The pipeline only talks to this trait, so the ONNX engine can be swapped
/// for another backend. Implementations must be safe to share across
/// workers for concurrent read-only inference.
pub trait Embedder: Send + Sync {
    /// Decode an encoded image and embed it.
    fn embed_image(&self, image_bytes: &[u8], path: &Path) -> PipelineResult<Vec<f32>>;

    /// Embed one label.
    fn embed_text(&self, label: &str) -> Result<Vec<f32>, ModelError>;

    /// Embed many labels, one vector per label in input order.
    fn embed_texts(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        labels.iter().map(|l| self.embed_text(l)).collect()
    }
}

/// Locations of the three artifacts an engine needs.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub visual: PathBuf,
    pub text: PathBuf,
    pub tokenizer: PathBuf,
}

impl ModelPaths {
    /// Resolve artifact paths for the configured model.
    pub fn resolve(config: &EmbeddingConfig, model_dir: &Path) -> Self {
        let base = model_dir.join(&config.model);
        Self {
            visual: base.join(VISUAL_MODEL_FILENAME),
            text: base.join(TEXT_MODEL_FILENAME),
            tokenizer: base.join(TOKENIZER_FILENAME),
        }
    }

    /// All artifact paths, visual first.
    pub fn all(&self) -> [&Path; 3] {
        [
            self.visual.as_path(),
            self.text.as_path(),
            self.tokenizer.as_path(),
        ]
    }

    /// Artifacts not present on disk.
    pub fn missing(&self) -> Vec<&Path> {
        self.all().into_iter().filter(|p| !p.exists()).collect()
    }
}

/// CLIP embedding engine backed by ONNX Runtime.
pub struct EmbeddingEngine {
    vision: ClipVisionSession,
    text: ClipTextEncoder,
    decoder: ImageDecoder,
    config: EmbeddingConfig,
}

impl EmbeddingEngine {
    /// Load both encoders and the tokenizer.
    ///
    /// Fails with [`ModelError`] if any artifact is missing or unloadable;
    /// there is no slower fallback path.
    pub fn load(config: &Config) -> Result<Self, ModelError> {
        let paths = Self::model_paths(config);
        if let Some(missing) = paths.missing().first() {
            return Err(ModelError::NotFound {
                path: missing.to_path_buf(),
            });
        }

        let start = std::time::Instant::now();
        tracing::info!("Loading CLIP model from {:?}", paths.visual.parent());
        let vision = ClipVisionSession::load(&paths.visual)?;
        let text = ClipTextEncoder::load(
            &paths.text,
            &paths.tokenizer,
            config.embedding.max_text_tokens,
        )?;
        tracing::info!("CLIP model loaded in {:.2?}", start.elapsed());

        Ok(Self {
            vision,
            text,
            decoder: ImageDecoder::new(config.limits.clone()),
            config: config.embedding.clone(),
        })
    }

    /// Where this configuration expects its model files.
    pub fn model_paths(config: &Config) -> ModelPaths {
        ModelPaths::resolve(&config.embedding, &config.model_dir())
    }

    /// Check whether every model file exists on disk.
    pub fn model_exists(config: &Config) -> bool {
        Self::model_paths(config).missing().is_empty()
    }
}

impl Embedder for EmbeddingEngine {
    fn embed_image(&self, image_bytes: &[u8], path: &Path) -> PipelineResult<Vec<f32>> {
        let decoded = self.decoder.decode(image_bytes, path)?;
        let tensor = preprocess(&decoded.image, self.config.image_size);
        self.vision.embed(&tensor, path)
    }

    fn embed_text(&self, label: &str) -> Result<Vec<f32>, ModelError> {
        self.embed_texts(&[label.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Inference {
                message: "Text encoder returned empty result for single input".to_string(),
            })
    }

    fn embed_texts(&self, labels: &[String]) -> Result<Vec<Vec<f32>>, ModelError> {
        let prompts: Vec<String> = labels
            .iter()
            .map(|l| self.config.prompt_for(l))
            .collect();
        self.text.encode_batch(&prompts)
    }
}
