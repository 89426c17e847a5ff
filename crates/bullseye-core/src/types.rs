//! Core data types for the Bullseye sorting pipeline.
//!
//! These types represent what happens to each image: how it was classified
//! and where it ended up.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A label paired with its similarity to one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    /// The label text, exactly as configured
    pub label: String,

    /// Cosine similarity between image and label embeddings
    pub score: f32,

    /// Softmax probability of this label across all labels
    pub probability: f32,
}

/// Outcome of scoring one image against every configured label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Source image path
    pub path: PathBuf,

    /// The winning label (always a member of the configured label set)
    pub label: String,

    /// Cosine similarity of the winning label
    pub score: f32,

    /// Softmax probability of the winning label across all labels
    pub probability: f32,

    /// Remaining labels, best first
    pub runners_up: Vec<LabelScore>,
}

/// Terminal status of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveStatus {
    /// The file now lives in its label folder
    Moved,
    /// A file of the same name was already in place; nothing was touched
    SkippedDuplicate,
    /// The image could not be decoded, embedded, or moved
    Failed,
}

/// Which stage a failed image broke in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Unreadable, corrupt, oversized, or unsupported image
    Decode,
    /// Inference failed for an otherwise valid image
    Embedding,
    /// Filesystem failure during placement
    Move,
}

/// Why an image failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

/// The terminal record for one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Where the image was found
    pub source: PathBuf,

    /// Where the image was (or would have been) placed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,

    pub status: MoveStatus,

    /// Label the image was routed to, if classification got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Cosine similarity of that label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Softmax probability of that label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f32>,

    /// Next-best labels, best first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runners_up: Vec<LabelScore>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl MoveOutcome {
    /// The file was moved to `destination`.
    pub fn moved(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::new(source.into(), Some(destination.into()), MoveStatus::Moved)
    }

    /// A file already occupied `destination`.
    pub fn skipped_duplicate(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::new(
            source.into(),
            Some(destination.into()),
            MoveStatus::SkippedDuplicate,
        )
    }

    /// The image failed at some stage.
    pub fn failed(
        source: impl Into<PathBuf>,
        destination: Option<PathBuf>,
        kind: FailureKind,
        reason: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::new(source.into(), destination, MoveStatus::Failed);
        outcome.failure = Some(Failure {
            kind,
            reason: reason.into(),
        });
        outcome
    }

    /// Attach the label, scores and runner-ups that routed this image.
    pub fn with_classification(mut self, result: &ClassificationResult) -> Self {
        self.label = Some(result.label.clone());
        self.score = Some(result.score);
        self.probability = Some(result.probability);
        self.runners_up = result.runners_up.clone();
        self
    }

    /// Attach just the label (for images found already sorted).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn new(source: PathBuf, destination: Option<PathBuf>, status: MoveStatus) -> Self {
        Self {
            source,
            destination,
            status,
            label: None,
            score: None,
            probability: None,
            runners_up: Vec::new(),
            failure: None,
        }
    }
}

/// Aggregated result of a full sorting run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Images moved into a label folder
    pub moved: usize,

    /// Images left alone because they were already in place
    pub skipped: usize,

    /// Images that failed
    pub failed: usize,

    /// Wall-clock duration of the processing phase in seconds
    pub total_seconds: f64,

    /// Per-image outcomes, in discovery order
    pub outcomes: Vec<MoveOutcome>,
}

impl RunReport {
    /// Build a report from outcomes, counting each status.
    pub fn from_outcomes(outcomes: Vec<MoveOutcome>, total_seconds: f64) -> Self {
        let mut report = Self {
            total_seconds,
            ..Self::default()
        };
        for outcome in &outcomes {
            match outcome.status {
                MoveStatus::Moved => report.moved += 1,
                MoveStatus::SkippedDuplicate => report.skipped += 1,
                MoveStatus::Failed => report.failed += 1,
            }
        }
        report.outcomes = outcomes;
        report
    }

    /// Total images seen.
    pub fn total(&self) -> usize {
        self.moved + self.skipped + self.failed
    }

    /// Failed outcomes only.
    pub fn failures(&self) -> impl Iterator<Item = &MoveOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == MoveStatus::Failed)
    }

    /// Images processed per second.
    pub fn images_per_second(&self) -> f64 {
        if self.total_seconds > 0.0 {
            self.total() as f64 / self.total_seconds
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_status_serializes_kebab_case() {
        let json = serde_json::to_string(&MoveStatus::SkippedDuplicate).unwrap();
        assert_eq!(json, "\"skipped-duplicate\"");
        let json = serde_json::to_string(&MoveStatus::Moved).unwrap();
        assert_eq!(json, "\"moved\"");
    }

    #[test]
    fn test_failed_outcome_skips_empty_fields() {
        let outcome = MoveOutcome::failed(
            "/photos/broken.jpg",
            None,
            FailureKind::Decode,
            "unexpected EOF",
        );
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("destination"));
        assert!(!json.contains("\"label\""));
        assert!(json.contains("\"kind\":\"decode\""));
        assert!(json.contains("unexpected EOF"));
    }

    #[test]
    fn test_with_classification_copies_scores() {
        let result = ClassificationResult {
            path: PathBuf::from("/photos/a.png"),
            label: "anime".to_string(),
            score: 0.31,
            probability: 0.9,
            runners_up: vec![LabelScore {
                label: "superheroes".to_string(),
                score: 0.12,
                probability: 0.07,
            }],
        };
        let outcome = MoveOutcome::moved("/photos/a.png", "/photos/anime/a.png")
            .with_classification(&result);
        assert_eq!(outcome.label.as_deref(), Some("anime"));
        assert_eq!(outcome.score, Some(0.31));
        assert_eq!(outcome.probability, Some(0.9));
        assert_eq!(outcome.runners_up, result.runners_up);

        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"runners_up\":[{\"label\":\"superheroes\""));
    }

    #[test]
    fn test_outcome_without_runners_up_omits_field() {
        let outcome = MoveOutcome::skipped_duplicate("a.png", "other/a.png").with_label("other");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("runners_up"));
    }

    #[test]
    fn test_run_report_counts() {
        let outcomes = vec![
            MoveOutcome::moved("a.jpg", "x/a.jpg"),
            MoveOutcome::moved("b.jpg", "x/b.jpg"),
            MoveOutcome::skipped_duplicate("c.jpg", "x/c.jpg"),
            MoveOutcome::failed("d.jpg", None, FailureKind::Decode, "corrupt"),
        ];
        let report = RunReport::from_outcomes(outcomes, 2.0);
        assert_eq!(report.moved, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total(), 4);
        assert_eq!(report.failures().count(), 1);
        assert!((report.images_per_second() - 2.0).abs() < 1e-9);
    }
}
