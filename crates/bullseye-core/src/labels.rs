//! Label configuration: the ordered set of categories images are sorted into.
//!
//! The label file is JSON with a single field:
//!
//! ```json
//! { "labels": ["anime", "superheroes", "other"] }
//! ```
//!
//! Labels are compared after trimming and case-folding, so `"Anime"` and
//! `"anime"` collide, as do `"Straße"` and `"STRASSE"`. Folding goes through
//! upper then lower case; that covers the common multi-character folds but
//! is not the full Unicode `CaseFolding.txt` table. Singular/plural pairs such as `"cat"` and `"cats"` are
//! NOT detected; keeping those apart is up to whoever writes the file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Labels written by [`LabelConfig::write_default`].
const DEFAULT_LABELS: &[&str] = &["anime"];

/// On-disk shape of the label file.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct LabelFile {
    labels: Vec<String>,
}

/// A validated, ordered set of labels. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelConfig {
    labels: Vec<String>,
}

impl LabelConfig {
    /// Load and validate a label file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let file: LabelFile = serde_json::from_str(&content)?;
        if file.labels.is_empty() {
            return Err(ConfigError::EmptyLabels(path.to_path_buf()));
        }
        let config = Self::from_labels(file.labels)?;
        tracing::debug!("Loaded {} labels from {:?}", config.len(), path);
        Ok(config)
    }

    /// Validate an in-memory label list.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut validated = Vec::new();

        for (index, raw) in labels.into_iter().enumerate() {
            let raw: String = raw.into();
            let label = raw.trim();
            if label.is_empty() {
                return Err(ConfigError::BlankLabel { index });
            }
            check_folder_name(label)?;

            let key = normalize(label);
            if let Some(original) = seen.get(&key) {
                return Err(ConfigError::DuplicateLabel {
                    original: original.clone(),
                    duplicate: label.to_string(),
                });
            }
            seen.insert(key, label.to_string());
            validated.push(label.to_string());
        }

        if validated.is_empty() {
            return Err(ConfigError::EmptyLabels(PathBuf::new()));
        }

        Ok(Self { labels: validated })
    }

    /// Write `{"labels": ["anime"]}` to `path` unless a file is already there.
    ///
    /// Returns `true` if a file was written.
    pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = LabelFile {
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(true)
    }

    /// Labels in configured order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Whether `name` is one of the configured labels, exactly as written.
    pub fn contains_exact(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }

    /// Number of labels (always at least one).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// BLAKE3 hash of the label list, order- and case-sensitive.
    ///
    /// Case matters because labels become folder names.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for label in &self.labels {
            hasher.update(label.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Trim and case-fold a label for duplicate detection.
fn normalize(label: &str) -> String {
    label.trim().to_uppercase().to_lowercase()
}

/// A label becomes a direct child folder of the input root.
fn check_folder_name(label: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidLabel {
        label: label.to_string(),
        reason: reason.to_string(),
    };
    if label == "." || label == ".." {
        return Err(invalid("reserved path component"));
    }
    if label.contains(['/', '\\']) {
        return Err(invalid("contains a path separator"));
    }
    if label.chars().any(char::is_control) {
        return Err(invalid("contains a control character"));
    }
    Ok(())
}
