//! The `bullseye labels` command for label files.

use bullseye_core::config::expand_path;
use bullseye_core::LabelConfig;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the `labels` command.
#[derive(Args, Debug)]
pub struct LabelsArgs {
    #[command(subcommand)]
    pub command: LabelsCommand,
}

/// Subcommands for label file management.
#[derive(Subcommand, Debug)]
pub enum LabelsCommand {
    /// Validate a label file and list its labels
    Check {
        /// Path to the label file
        file: PathBuf,
    },

    /// Write a starter label file if none exists
    Init {
        /// Where to write it
        #[arg(default_value = "labels.json")]
        file: PathBuf,
    },
}

/// Execute the labels command.
pub async fn execute(args: LabelsArgs) -> anyhow::Result<()> {
    match args.command {
        LabelsCommand::Check { file } => {
            let labels = LabelConfig::load(&expand_path(&file))?;
            for line in describe(&labels) {
                println!("{line}");
            }
        }

        LabelsCommand::Init { file } => {
            let path = expand_path(&file);
            if LabelConfig::write_default(&path)? {
                println!("Label file created at: {}", path.display());
            } else {
                println!("Label file already exists at: {}", path.display());
            }
        }
    }

    Ok(())
}

/// Human-readable listing of a validated label set.
fn describe(labels: &LabelConfig) -> Vec<String> {
    let mut lines = vec![format!("{} label(s), all valid:", labels.len())];
    lines.extend(
        labels
            .labels()
            .iter()
            .enumerate()
            .map(|(i, label)| format!("  {:>2}. {label}", i + 1)),
    );
    lines
}
