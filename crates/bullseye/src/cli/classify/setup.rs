//! Driver setup: config overrides, label validation, model loading.

use bullseye_core::config::expand_path;
use bullseye_core::{Config, EmbeddingEngine, LabelConfig, ModelError, PipelineDriver};
use std::path::PathBuf;
use std::sync::Arc;

use super::ClassifyArgs;

/// Everything `execute` needs once setup succeeded.
pub(crate) struct ClassifyContext {
    pub driver: PipelineDriver,
    pub input: PathBuf,
    pub report_path: Option<PathBuf>,
}

/// Validate input, apply overrides, load labels and model, and build the driver.
///
/// Labels are checked before the model is loaded so a typo in the label
/// file fails fast.
pub(crate) fn setup_driver(args: &ClassifyArgs, config: Config) -> anyhow::Result<ClassifyContext> {
    let input = expand_path(&args.input);
    if !input.is_dir() {
        anyhow::bail!(
            "Input folder does not exist: {:?}\n\n  Hint: pass the folder that contains the images to sort.",
            input
        );
    }

    let config = apply_overrides(config, args)?;

    let labels_path = expand_path(&args.labels);
    let labels = LabelConfig::load(&labels_path).map_err(|e| {
        anyhow::anyhow!(
            "{e}\n\n  Hint: the label file must look like {{\"labels\": [\"anime\", \"other\"]}}. \
             Run `bullseye labels init` to create one."
        )
    })?;

    let engine = EmbeddingEngine::load(&config).map_err(|e| match e {
        ModelError::NotFound { .. } => anyhow::anyhow!(
            "{e}\n\n  Hint: run `bullseye models check` to see which files are expected."
        ),
        other => other.into(),
    })?;

    let mut driver = PipelineDriver::new(config, Arc::new(engine));
    driver.set_labels(labels);
    driver.build_index()?;

    Ok(ClassifyContext {
        driver,
        input,
        report_path: args.report.as_deref().map(expand_path),
    })
}

/// Apply command-line overrides on top of the file configuration.
fn apply_overrides(mut config: Config, args: &ClassifyArgs) -> anyhow::Result<Config> {
    if let Some(parallel) = args.parallel {
        if parallel == 0 {
            anyhow::bail!("--parallel must be at least 1");
        }
        config.processing.parallel_workers = parallel;
    }
    if let Some(dir) = &args.model_dir {
        config.general.model_dir = dir.clone();
    }
    Ok(config)
}
