//! Terminal output for a sorting run: progress bar, per-image lines, summary.

use bullseye_core::{MoveOutcome, MoveStatus, RunReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Create the progress bar, or a hidden one when disabled.
pub fn create_progress_bar(total: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("classifying...");
    pb
}

/// One stdout line per finished image.
pub fn format_outcome(outcome: &MoveOutcome) -> String {
    let name = display_name(&outcome.source);
    match outcome.status {
        MoveStatus::Moved => format!(
            "{name} -> {}/{}{}",
            outcome.label.as_deref().unwrap_or("?"),
            probability_suffix(outcome),
            runners_up_suffix(outcome)
        ),
        MoveStatus::SkippedDuplicate => match outcome.label.as_deref() {
            Some(label) => format!("{name} already in {label}/ (skipped)"),
            None => format!("{name} (skipped)"),
        },
        MoveStatus::Failed => {
            let reason = outcome
                .failure
                .as_ref()
                .map(|f| format!("{:?}: {}", f.kind, f.reason))
                .unwrap_or_default();
            format!("{name} FAILED ({reason})")
        }
    }
}

fn probability_suffix(outcome: &MoveOutcome) -> String {
    outcome
        .probability
        .map(|p| format!(" ({:.1}%)", p * 100.0))
        .unwrap_or_default()
}

/// `" | superheroes 2.1%, other 0.6%"`, or nothing without runner-ups.
fn runners_up_suffix(outcome: &MoveOutcome) -> String {
    if outcome.runners_up.is_empty() {
        return String::new();
    }
    let others: Vec<String> = outcome
        .runners_up
        .iter()
        .map(|r| format!("{} {:.1}%", r.label, r.probability * 100.0))
        .collect();
    format!(" | {}", others.join(", "))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Print a formatted summary table, then each failure.
pub fn print_summary(report: &RunReport) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Moved:        {:>8}", report.moved);
    if report.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", report.skipped);
    }
    if report.failed > 0 {
        eprintln!("    Failed:       {:>8}", report.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", report.total());
    eprintln!("    Duration:     {:>7.1}s", report.total_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", report.images_per_second());
    eprintln!("  ====================================");

    if report.failed > 0 {
        eprintln!();
        eprintln!("  Failures:");
        for outcome in report.failures() {
            let reason = outcome
                .failure
                .as_ref()
                .map(|f| f.reason.as_str())
                .unwrap_or("unknown");
            eprintln!("    {}: {}", outcome.source.display(), reason);
        }
    }
}
