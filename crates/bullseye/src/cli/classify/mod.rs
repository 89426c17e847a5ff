//! The `bullseye classify` command: sort a folder into label subfolders.

mod setup;
mod summary;

use bullseye_core::{Config, OutputFormat as CoreOutputFormat, ReportWriter};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use setup::setup_driver;
use summary::{create_progress_bar, format_outcome, print_summary};

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Folder whose images should be sorted
    pub input: PathBuf,

    /// JSON label file, e.g. {"labels": ["anime", "other"]}
    pub labels: PathBuf,

    /// Number of images processed concurrently (overrides config)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Directory holding the converted CLIP model (overrides config)
    #[arg(long, env = "BULLSEYE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Also write a machine-readable report to this file
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Report format (defaults to the report file's extension)
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Supported report formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    /// Single JSON document
    Json,
    /// One outcome per line plus a summary line
    Jsonl,
}

impl From<ReportFormat> for CoreOutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => CoreOutputFormat::Json,
            ReportFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Execute the classify command.
///
/// Per-image failures are reported but do not fail the command; label,
/// model, and input-folder problems do.
pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_driver(&args, config)?;
    let mut driver = ctx.driver;

    let images = driver.discover(&ctx.input)?;
    if images.is_empty() {
        tracing::warn!("No supported image files found in {:?}", ctx.input);
    } else {
        tracing::info!("Found {} image(s) in {:?}", images.len(), ctx.input);
    }

    let pb = create_progress_bar(images.len() as u64, args.no_progress);
    let bar = pb.clone();
    let report = driver
        .process(&ctx.input, move |outcome| {
            bar.suspend(|| println!("{}", format_outcome(outcome)));
            bar.inc(1);
        })
        .await?;
    pb.finish_and_clear();

    print_summary(&report);

    if let Some(path) = &ctx.report_path {
        let format = args
            .format
            .map(CoreOutputFormat::from)
            .unwrap_or_else(|| CoreOutputFormat::from_path(path));
        let mut writer = ReportWriter::create(path, format)?;
        writer.write_report(&report)?;
        tracing::info!("Report written to {:?}", path);
    }

    Ok(())
}
