//! Error types for the Bullseye sorting pipeline.
//!
//! Fatal setup errors (`ConfigError`, `ModelError`) abort a run before any
//! image is touched. Per-image errors (`PipelineError`) are recorded on the
//! image's outcome and never stop the rest of the batch.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::FailureKind;

/// Top-level error type for Bullseye operations.
#[derive(Error, Debug)]
pub enum BullseyeError {
    /// Label or settings configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model artifacts missing or unusable
    #[error("Model load error: {0}")]
    Model(#[from] ModelError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// The folder to sort does not exist or is not a directory
    #[error("Input folder does not exist: {0}")]
    InputNotFound(PathBuf),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Label file is not valid JSON of the expected shape
    #[error("Failed to parse label file: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Failed to parse TOML settings
    #[error("Failed to parse settings: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The label list is empty
    #[error("Label file {0} contains no labels")]
    EmptyLabels(PathBuf),

    /// A label is empty after trimming whitespace
    #[error("Label #{index} is blank")]
    BlankLabel { index: usize },

    /// A label cannot be used as a folder name
    #[error("Label {label:?} is not a valid folder name: {reason}")]
    InvalidLabel { label: String, reason: String },

    /// Two labels are equal after trimming and case-folding (upper then
    /// lower case, not the full Unicode folding table)
    #[error("Duplicate label {duplicate:?} (collides with {original:?})")]
    DuplicateLabel { original: String, duplicate: String },

    /// Settings values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Model loading and inference-setup errors.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A required model artifact is not on disk
    #[error("Model artifact not found at {path}. Convert the model to ONNX and place it there first.")]
    NotFound { path: PathBuf },

    /// The artifact exists but ONNX Runtime or the tokenizer rejected it
    #[error("Failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Inference ran but produced something unusable
    #[error("Inference failed: {message}")]
    Inference { message: String },

    /// Two embeddings that must share a space have different sizes
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Per-image pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image could not be read or decoded
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Embedding generation failed
    #[error("Embedding failed for {path}: {message}")]
    Embedding { path: PathBuf, message: String },

    /// Filesystem failure while placing the image
    #[error("Move failed for {path}: {message}")]
    Move { path: PathBuf, message: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

impl PipelineError {
    /// The outcome category this error is reported under.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Decode { .. }
            | Self::FileTooLarge { .. }
            | Self::ImageTooLarge { .. }
            | Self::FileNotFound(_) => FailureKind::Decode,
            Self::Embedding { .. } => FailureKind::Embedding,
            Self::Move { .. } => FailureKind::Move,
        }
    }
}

/// Convenience type alias for Bullseye results.
pub type Result<T> = std::result::Result<T, BullseyeError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
