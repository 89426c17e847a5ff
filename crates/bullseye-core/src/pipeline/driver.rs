//! End-to-end sorting run: labels → index → per-image classify and move.
//!
//! The driver moves through `Idle → ConfigLoaded → IndexBuilt → Processing
//! → Done`. Setup failures (labels, model, missing root) surface as errors
//! before any image is touched. During processing each image is handled by
//! its own task, bounded by a semaphore; a failed or panicked image becomes a
//! failed outcome and the run still reaches `Done`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::Semaphore;

use crate::classify::Classifier;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::{BullseyeError, ConfigError, Result};
use crate::index::LabelIndex;
use crate::labels::LabelConfig;
use crate::organize::Organizer;
use crate::types::{FailureKind, MoveOutcome, MoveStatus, RunReport};

use super::discovery::{DiscoveredImage, FileDiscovery};
use super::validate::Validator;

/// Lifecycle of one driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    ConfigLoaded,
    IndexBuilt,
    Processing,
    Done,
}

/// Where one image is in its journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStage {
    Discovered,
    Embedded,
    Classified,
    Placed,
    Failed,
}

impl fmt::Display for ImageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discovered => "discovered",
            Self::Embedded => "embedded",
            Self::Classified => "classified",
            Self::Placed => "placed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything a worker needs, shared read-only across tasks.
struct ImageContext {
    root: PathBuf,
    engine: Arc<dyn Embedder>,
    index: Arc<LabelIndex>,
    classifier: Classifier,
    organizer: Organizer,
    validator: Validator,
}

/// Orchestrates one sorting run over an input folder.
pub struct PipelineDriver {
    config: Config,
    engine: Arc<dyn Embedder>,
    state: DriverState,
    labels: Option<LabelConfig>,
    index: Option<Arc<LabelIndex>>,
}

impl PipelineDriver {
    /// Create an idle driver around an already-loaded engine.
    pub fn new(config: Config, engine: Arc<dyn Embedder>) -> Self {
        Self {
            config,
            engine,
            state: DriverState::Idle,
            labels: None,
            index: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Labels in use, once loaded.
    pub fn labels(&self) -> Option<&LabelConfig> {
        self.labels.as_ref()
    }

    /// Load and validate the label file.
    pub fn load_labels(&mut self, path: &Path) -> Result<&LabelConfig> {
        let labels = LabelConfig::load(path)?;
        Ok(self.set_labels(labels))
    }

    /// Use an already-validated label set.
    pub fn set_labels(&mut self, labels: LabelConfig) -> &LabelConfig {
        tracing::info!("Loaded {} labels: {}", labels.len(), labels.labels().join(", "));
        self.state = DriverState::ConfigLoaded;
        self.labels.insert(labels)
    }

    /// Embed the labels, reusing the current index if the labels are unchanged.
    pub fn build_index(&mut self) -> Result<Arc<LabelIndex>> {
        let labels = self.labels.as_ref().ok_or_else(labels_not_loaded)?;

        let index = match self.index.take() {
            Some(existing) => existing.ensure_current(labels, self.engine.as_ref())?,
            None => Arc::new(LabelIndex::build(labels, self.engine.as_ref())?),
        };
        self.index = Some(Arc::clone(&index));
        self.state = DriverState::IndexBuilt;
        Ok(index)
    }

    /// Images under `root` that this run would look at.
    pub fn discover(&self, root: &Path) -> Result<Vec<DiscoveredImage>> {
        let labels = self.labels.as_ref().ok_or_else(labels_not_loaded)?;
        ensure_root(root)?;
        Ok(FileDiscovery::new(self.config.processing.clone()).discover(root, labels))
    }

    /// Full run: load labels, build the index, then sort `root`.
    pub async fn run(&mut self, root: &Path, labels_path: &Path) -> Result<RunReport> {
        ensure_root(root)?;
        self.load_labels(labels_path)?;
        self.build_index()?;
        self.process(root, |_| {}).await
    }

    /// Sort every discovered image of `root`.
    ///
    /// `on_outcome` is called as each image finishes, in completion order.
    /// The returned report lists outcomes in discovery order.
    pub async fn process<F>(&mut self, root: &Path, on_outcome: F) -> Result<RunReport>
    where
        F: Fn(&MoveOutcome) + Send + Sync + 'static,
    {
        let images = self.discover(root)?;
        let index = self.build_index()?;

        self.state = DriverState::Processing;
        let start = Instant::now();
        let pending = images.iter().filter(|image| image.is_pending()).count();
        tracing::info!(
            "Sorting {} images ({} already in label folders, {:.1} MB) with {} workers",
            pending,
            images.len() - pending,
            FileDiscovery::total_size(&images) as f64 / (1024.0 * 1024.0),
            self.config.processing.parallel_workers
        );

        let context = Arc::new(ImageContext {
            root: root.to_path_buf(),
            engine: Arc::clone(&self.engine),
            index,
            classifier: Classifier::new(self.config.classify.clone()),
            organizer: Organizer::new(),
            validator: Validator::new(self.config.limits.clone()),
        });
        let semaphore = Arc::new(Semaphore::new(self.config.processing.parallel_workers.max(1)));
        let on_outcome = Arc::new(on_outcome);
        let mut handles = Vec::with_capacity(images.len());

        for image in images {
            let path = image.path.clone();
            let semaphore = Arc::clone(&semaphore);
            let context = Arc::clone(&context);
            let on_outcome = Arc::clone(&on_outcome);

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let source = image.path.clone();
                let outcome = tokio::task::spawn_blocking(move || handle_image(image, &context))
                    .await
                    .unwrap_or_else(|e| {
                        MoveOutcome::failed(
                            source,
                            None,
                            FailureKind::Embedding,
                            format!("worker panicked: {e}"),
                        )
                    });
                on_outcome(&outcome);
                outcome
            });
            handles.push((path, handle));
        }

        let (paths, handles): (Vec<PathBuf>, Vec<_>) = handles.into_iter().unzip();
        let outcomes: Vec<MoveOutcome> = join_all(handles)
            .await
            .into_iter()
            .zip(paths)
            .map(|(joined, path)| {
                joined.unwrap_or_else(|e| {
                    tracing::error!("Task for {:?} panicked: {e}", path);
                    MoveOutcome::failed(path, None, FailureKind::Embedding, format!("task panicked: {e}"))
                })
            })
            .collect();

        let report = RunReport::from_outcomes(outcomes, start.elapsed().as_secs_f64());
        self.state = DriverState::Done;
        tracing::info!(
            "Done: {} moved, {} skipped, {} failed in {:.2}s",
            report.moved,
            report.skipped,
            report.failed,
            report.total_seconds
        );
        Ok(report)
    }
}

/// Take one image from discovery to its final outcome.
fn handle_image(image: DiscoveredImage, ctx: &ImageContext) -> MoveOutcome {
    let path = image.path;
    if let Some(label) = image.placed_in {
        tracing::debug!("{:?}: already in {label}/", path);
        return MoveOutcome::skipped_duplicate(&path, &path).with_label(label);
    }
    log_stage(&path, ImageStage::Discovered);

    let embedding = match ctx
        .validator
        .read_checked(&path)
        .and_then(|bytes| ctx.engine.embed_image(&bytes, &path))
    {
        Ok(embedding) => embedding,
        Err(e) => {
            log_stage(&path, ImageStage::Failed);
            tracing::warn!("{e}");
            return MoveOutcome::failed(&path, None, e.kind(), e.to_string());
        }
    };
    log_stage(&path, ImageStage::Embedded);

    let result = match ctx.classifier.classify(&path, &embedding, &ctx.index) {
        Ok(result) => result,
        Err(e) => {
            log_stage(&path, ImageStage::Failed);
            tracing::warn!("Classification failed for {:?}: {e}", path);
            return MoveOutcome::failed(&path, None, FailureKind::Embedding, e.to_string());
        }
    };
    log_stage(&path, ImageStage::Classified);

    let outcome = ctx
        .organizer
        .place(&path, &result.label, &ctx.root)
        .with_classification(&result);
    match outcome.status {
        MoveStatus::Failed => log_stage(&path, ImageStage::Failed),
        _ => log_stage(&path, ImageStage::Placed),
    }
    outcome
}

fn log_stage(path: &Path, stage: ImageStage) {
    tracing::debug!(stage = %stage, "{:?}", path);
}

fn ensure_root(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(BullseyeError::InputNotFound(root.to_path_buf()))
    }
}

fn labels_not_loaded() -> BullseyeError {
    ConfigError::ValidationError("labels must be loaded before processing".to_string()).into()
}
