//! Zero-shot classification of one image embedding against the label index.
//!
//! Scores are cosine similarities; the winner is the highest score, with
//! near-ties going to the label declared first. Probabilities are a softmax
//! over CLIP's scaled logits and are informational only.

use std::path::Path;

use crate::config::ClassifyConfig;
use crate::error::ModelError;
use crate::index::LabelIndex;
use crate::math::scaled_softmax;
use crate::types::{ClassificationResult, LabelScore};

/// A later label must beat the current best by more than this to win.
pub const TIE_EPSILON: f32 = 1e-6;

/// CLIP's learned temperature (exp of the trained logit scale, clamped at 100).
pub const LOGIT_SCALE: f32 = 100.0;

/// Picks the best label for an image.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifyConfig,
}

impl Classifier {
    pub fn new(config: ClassifyConfig) -> Self {
        Self { config }
    }

    /// Classify one image embedding.
    ///
    /// The returned label is always one of `index.labels()`.
    pub fn classify(
        &self,
        path: &Path,
        image_embedding: &[f32],
        index: &LabelIndex,
    ) -> Result<ClassificationResult, ModelError> {
        let scores = index.scores(image_embedding)?;
        let best = best_position(&scores).ok_or_else(|| ModelError::Inference {
            message: "Label index is empty".to_string(),
        })?;
        let probabilities = scaled_softmax(&scores, LOGIT_SCALE);
        let labels = index.labels();

        let mut others: Vec<usize> = (0..scores.len()).filter(|&i| i != best).collect();
        // Stable sort keeps declaration order among equal scores.
        others.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        let runners_up = others
            .into_iter()
            .take(self.config.max_runner_ups)
            .map(|i| LabelScore {
                label: labels[i].clone(),
                score: scores[i],
                probability: probabilities[i],
            })
            .collect();

        Ok(ClassificationResult {
            path: path.to_path_buf(),
            label: labels[best].clone(),
            score: scores[best],
            probability: probabilities[best],
            runners_up,
        })
    }
}

/// Index of the maximum score, earliest position on near-ties.
fn best_position(scores: &[f32]) -> Option<usize> {
    let (first, rest) = scores.split_first()?;
    let mut best = (0, *first);
    for (offset, &score) in rest.iter().enumerate() {
        if score > best.1 + TIE_EPSILON {
            best = (offset + 1, score);
        }
    }
    Some(best.0)
}
