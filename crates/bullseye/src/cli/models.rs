//! The `bullseye models` command for inspecting the local CLIP model.
//!
//! Models are never downloaded; they must be converted to ONNX beforehand
//! and placed under the model directory.

use bullseye_core::{Config, EmbeddingEngine, ModelPaths};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,

    /// Directory holding the converted CLIP model (overrides config)
    #[arg(long, global = true, env = "BULLSEYE_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Show where the model files are expected
    Path,

    /// Report which model files are present
    Check,
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(dir) = args.model_dir {
        config.general.model_dir = dir;
    }
    let paths = EmbeddingEngine::model_paths(&config);

    match args.command {
        ModelsCommand::Path => {
            println!("{}", config.model_dir().join(&config.embedding.model).display());
        }

        ModelsCommand::Check => {
            for line in status_lines(&paths) {
                println!("{line}");
            }
            let missing = paths.missing();
            if !missing.is_empty() {
                anyhow::bail!(
                    "{} of 3 model files missing for {:?}.\n\n  \
                     Hint: export the CLIP visual and text encoders to ONNX \
                     (e.g. Xenova/clip-vit-base-patch32) and copy them to the paths above.",
                    missing.len(),
                    config.embedding.model
                );
            }
            println!("Model {:?} is ready.", config.embedding.model);
        }
    }

    Ok(())
}

fn status_lines(paths: &ModelPaths) -> Vec<String> {
    paths
        .all()
        .iter()
        .map(|path| {
            let status = if path.exists() { "found  " } else { "MISSING" };
            format!("  [{status}] {}", path.display())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_mark_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let paths = ModelPaths::resolve(&config.embedding, dir.path());
        std::fs::create_dir_all(paths.visual.parent().unwrap()).unwrap();
        std::fs::write(&paths.visual, b"onnx").unwrap();

        let lines = status_lines(&paths);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("found") && lines[0].ends_with("visual.onnx"));
        assert!(lines[1].contains("MISSING"));
        assert!(lines[2].contains("MISSING"));
    }

    #[tokio::test]
    async fn check_fails_when_model_absent() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(
            ModelsArgs {
                command: ModelsCommand::Check,
                model_dir: Some(dir.path().to_path_buf()),
            },
            Config::default(),
        )
        .await;
        assert!(result.is_err());
    }
}
