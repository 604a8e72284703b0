//! The fitted classifier artifact: parameters, label vocabulary, metadata.
//!
//! Immutable once built. A new training run produces a whole new artifact;
//! nothing here is updated in place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use linfa::prelude::*;
use linfa_logistic::MultiFittedLogisticRegression;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current artifact schema version, bumped on incompatible changes.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("embedding dimension {actual} does not match model dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("classifier produced unknown class index {0}")]
    UnknownClass(usize),
}

/// Training-quality metadata persisted alongside the classifier and
/// mirrored into the human-readable sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub trained_at: DateTime<Utc>,
    /// Dimension observed during training; inference must match it exactly.
    pub embedding_dim: usize,
    pub total_samples: usize,
    /// Per-label sample counts, after augmentation. Class imbalance is not
    /// corrected; the counts are recorded so it stays visible.
    pub samples_per_label: BTreeMap<String, usize>,
}

/// Fitted multinomial classifier plus its ordered label vocabulary.
///
/// The vocabulary fixes the index-to-label mapping for the artifact's
/// lifetime; predictions index into it.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    pub version: u32,
    classifier: MultiFittedLogisticRegression<f64, usize>,
    labels: Vec<String>,
    pub metadata: TrainingMetadata,
}

impl TrainedModel {
    pub(crate) fn new(
        classifier: MultiFittedLogisticRegression<f64, usize>,
        labels: Vec<String>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            classifier,
            labels,
            metadata,
        }
    }

    /// Ordered label vocabulary (index = class id).
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn embedding_dim(&self) -> usize {
        self.metadata.embedding_dim
    }

    /// Raw argmax prediction for one embedding, before any relabeling.
    pub fn predict(&self, embedding: &[f32]) -> Result<String, PredictError> {
        if embedding.len() != self.metadata.embedding_dim {
            return Err(PredictError::DimensionMismatch {
                expected: self.metadata.embedding_dim,
                actual: embedding.len(),
            });
        }

        let row: Vec<f64> = embedding.iter().map(|&v| f64::from(v)).collect();
        let x = Array2::from_shape_vec((1, embedding.len()), row).map_err(|_| {
            PredictError::DimensionMismatch {
                expected: self.metadata.embedding_dim,
                actual: embedding.len(),
            }
        })?;

        let prediction = self.classifier.predict(&x);
        let index = prediction[0];
        self.labels
            .get(index)
            .cloned()
            .ok_or(PredictError::UnknownClass(index))
    }
}
