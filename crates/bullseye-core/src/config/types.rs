//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where converted models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.bullseye/models"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of images classified concurrently
    pub parallel_workers: usize,

    /// File extensions picked up from the input folder
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            supported_formats: ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model folder name under `general.model_dir`
    pub model: String,

    /// Square input size expected by the visual encoder
    pub image_size: u32,

    /// Token limit for the text encoder (CLIP uses 77)
    pub max_text_tokens: usize,

    /// Text sent to the encoder for each label; `{label}` is substituted
    pub prompt_template: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "clip-vit-base-patch32".to_string(),
            image_size: 224,
            max_text_tokens: 77,
            prompt_template: "{label}".to_string(),
        }
    }
}

impl EmbeddingConfig {
    /// Render the prompt for one label.
    pub fn prompt_for(&self, label: &str) -> String {
        self.prompt_template.replace("{label}", label)
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// How many non-winning labels to keep on each result
    pub max_runner_ups: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { max_runner_ups: 3 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,

    /// Also append logs to this file (e.g. "~/.bullseye/bullseye.log")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_default_is_raw_label() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.prompt_for("anime"), "anime");
    }

    #[test]
    fn test_prompt_template_substitution() {
        let config = EmbeddingConfig {
            prompt_template: "a photo of {label}".to_string(),
            ..EmbeddingConfig::default()
        };
        assert_eq!(config.prompt_for("superheroes"), "a photo of superheroes");
    }
}
