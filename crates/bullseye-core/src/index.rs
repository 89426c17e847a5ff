//! Pre-computed label embeddings for fast scoring.
//!
//! The index stores a flat N×D matrix of text embeddings (one row per label,
//! in configured order) that is dot-producted against each image embedding.
//! It lives in memory for one run and is rebuilt when the labels change.

use std::sync::Arc;

use ndarray::{ArrayView1, ArrayView2};

use crate::embedding::Embedder;
use crate::error::ModelError;
use crate::labels::LabelConfig;

/// Label embeddings for one label configuration.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    labels: Vec<String>,
    /// Flat matrix: N × D stored row-major.
    matrix: Vec<f32>,
    embedding_dim: usize,
    fingerprint: String,
}

impl LabelIndex {
    /// Embed every configured label with one batched call.
    pub fn build(config: &LabelConfig, engine: &dyn Embedder) -> Result<Self, ModelError> {
        let start = std::time::Instant::now();
        let vectors = engine.embed_texts(config.labels())?;
        let index = Self::from_vectors(config, vectors)?;
        tracing::info!(
            "Label index ready: {} labels x {} dims in {:.2?}",
            index.len(),
            index.embedding_dim,
            start.elapsed()
        );
        Ok(index)
    }

    /// Assemble an index from vectors already in label order.
    pub fn from_vectors(config: &LabelConfig, vectors: Vec<Vec<f32>>) -> Result<Self, ModelError> {
        if vectors.len() != config.len() {
            return Err(ModelError::Inference {
                message: format!(
                    "Expected {} label embeddings, got {}",
                    config.len(),
                    vectors.len()
                ),
            });
        }
        let embedding_dim = vectors.first().map(Vec::len).unwrap_or(0);
        let mut matrix = Vec::with_capacity(vectors.len() * embedding_dim);
        for vector in &vectors {
            if vector.len() != embedding_dim || embedding_dim == 0 {
                return Err(ModelError::DimensionMismatch {
                    expected: embedding_dim,
                    actual: vector.len(),
                });
            }
            matrix.extend_from_slice(vector);
        }

        Ok(Self {
            labels: config.labels().to_vec(),
            matrix,
            embedding_dim,
            fingerprint: config.fingerprint(),
        })
    }

    /// Whether this index was built from exactly these labels.
    pub fn is_current(&self, config: &LabelConfig) -> bool {
        self.fingerprint == config.fingerprint()
    }

    /// Return `self` if still current, otherwise a freshly built index.
    pub fn ensure_current(
        self: Arc<Self>,
        config: &LabelConfig,
        engine: &dyn Embedder,
    ) -> Result<Arc<Self>, ModelError> {
        if self.is_current(config) {
            Ok(self)
        } else {
            tracing::info!("Label configuration changed, rebuilding label index");
            Self::build(config, engine).map(Arc::new)
        }
    }

    /// Cosine similarity of `image` against every label, in label order.
    ///
    /// Both sides are L2-normalized, so the dot product is the cosine.
    pub fn scores(&self, image: &[f32]) -> Result<Vec<f32>, ModelError> {
        if image.len() != self.embedding_dim {
            return Err(ModelError::DimensionMismatch {
                expected: self.embedding_dim,
                actual: image.len(),
            });
        }
        let matrix = ArrayView2::from_shape((self.labels.len(), self.embedding_dim), self.matrix.as_slice())
            .map_err(|e| ModelError::Inference {
                message: format!("Malformed label matrix: {e}"),
            })?;
        Ok(matrix.dot(&ArrayView1::from(image)).to_vec())
    }

    /// Labels in configured order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels in the index.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
