//! Bullseye Core - zero-shot image sorting library.
//!
//! Bullseye embeds a folder of images and a list of free-text labels into
//! CLIP's shared space, picks the closest label for each image, and moves the
//! image into a folder named after that label.
//!
//! # Architecture
//!
//! ```text
//! labels.json → LabelConfig → LabelIndex (text embeddings, once per run)
//! image → Validate → Decode → Embed (CLIP) → Classify → Organize → RunReport
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bullseye_core::{Config, EmbeddingEngine, PipelineDriver};
//!
//! #[tokio::main]
//! async fn main() -> bullseye_core::Result<()> {
//!     let config = Config::load()?;
//!     let engine = Arc::new(EmbeddingEngine::load(&config)?);
//!     let mut driver = PipelineDriver::new(config, engine);
//!
//!     let report = driver.run("./downloads".as_ref(), "./labels.json".as_ref()).await?;
//!     println!("{} moved, {} failed", report.moved, report.failed);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod labels;
pub mod math;
pub mod organize;
pub mod output;
pub mod pipeline;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use classify::Classifier;
pub use config::Config;
pub use embedding::{Embedder, EmbeddingEngine, ModelPaths};
pub use error::{BullseyeError, ConfigError, ModelError, PipelineError, PipelineResult, Result};
pub use index::LabelIndex;
pub use labels::LabelConfig;
pub use organize::Organizer;
pub use output::{OutputFormat, ReportWriter};
pub use pipeline::{DriverState, PipelineDriver};
pub use types::{
    ClassificationResult, FailureKind, LabelScore, MoveOutcome, MoveStatus, RunReport,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
