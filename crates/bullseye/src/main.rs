//! Bullseye CLI - sort images into label folders with zero-shot CLIP.
//!
//! Bullseye embeds every image in a folder and a list of free-text labels
//! with a local CLIP model, then moves each image into a subfolder named
//! after its closest label.
//!
//! # Usage
//!
//! ```bash
//! # Sort ./downloads using the labels in labels.json
//! bullseye classify ./downloads labels.json
//!
//! # Same, with a JSONL report
//! bullseye classify ./downloads labels.json --report run.jsonl
//!
//! # Check a label file
//! bullseye labels check labels.json
//!
//! # See whether the model files are in place
//! bullseye models check
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Bullseye - sort images into label folders with zero-shot CLIP classification.
#[derive(Parser, Debug)]
#[command(name = "bullseye")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify every image in a folder and move it into its label's subfolder
    Classify(cli::classify::ClassifyArgs),

    /// Validate or create label files
    Labels(cli::labels::LabelsArgs),

    /// Inspect the local CLIP model files
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    // Every command works from this one effective configuration.
    let config = match bullseye_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `bullseye config path`."
            );
            bullseye_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Bullseye v{}", bullseye_core::VERSION);

    match cli.command {
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Labels(args) => cli::labels::execute(args).await,
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_classify_with_options() {
        let cli = Cli::try_parse_from([
            "bullseye",
            "classify",
            "./downloads",
            "labels.json",
            "--parallel",
            "2",
            "--report",
            "run.jsonl",
            "--no-progress",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Classify(args) => {
                assert_eq!(args.parallel, Some(2));
                assert!(args.no_progress);
                assert_eq!(args.labels, std::path::PathBuf::from("labels.json"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn classify_requires_labels_argument() {
        assert!(Cli::try_parse_from(["bullseye", "classify", "./downloads"]).is_err());
    }
}
