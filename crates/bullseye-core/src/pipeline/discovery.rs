//! Finding the images of an input root.
//!
//! Only direct files of the root are candidates. Files inside a direct
//! child folder named after a configured label were sorted by an earlier
//! run; they are reported with `placed_in` set so the driver can skip them
//! without classifying again. Any other subfolder is left alone.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::labels::LabelConfig;

/// Discovers image files under an input root.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered image.
#[derive(Debug, Clone)]
pub struct DiscoveredImage {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Label folder the file already sits in, if any
    pub placed_in: Option<String>,
}

impl DiscoveredImage {
    /// Whether this image still needs classifying.
    pub fn is_pending(&self) -> bool {
        self.placed_in.is_none()
    }
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover supported images in `root` and in its label folders.
    ///
    /// Results are sorted by path.
    pub fn discover(&self, root: &Path, labels: &LabelConfig) -> Vec<DiscoveredImage> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(2)
            .into_iter()
            .filter_entry(|e| e.depth() < 1 || e.file_type().is_file() || Self::is_label_dir(e, labels))
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if !entry.file_type().is_file() || !self.is_supported(entry_path) {
                continue;
            }

            let placed_in = match entry.depth() {
                1 => None,
                _ => entry_path
                    .parent()
                    .and_then(Path::file_name)
                    .and_then(|n| n.to_str())
                    .map(str::to_string),
            };

            match entry.metadata() {
                Ok(meta) => files.push(DiscoveredImage {
                    path: entry_path.to_path_buf(),
                    size: meta.len(),
                    placed_in,
                }),
                Err(e) => tracing::warn!("Skipping {:?}: {e}", entry_path),
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Directories at depth 1 are descended only if named exactly as a label.
    fn is_label_dir(entry: &walkdir::DirEntry, labels: &LabelConfig) -> bool {
        entry.depth() == 1
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| labels.contains_exact(name))
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredImage]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
