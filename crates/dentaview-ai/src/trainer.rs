//! Multinomial logistic-regression training over image embeddings.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use dentaview_core::dataset::Sample;
use linfa::prelude::*;
use linfa_logistic::MultiLogisticRegression;
use ndarray::{Array1, Array2};
use thiserror::Error;
use tracing::{debug, info};

use crate::augment::{self, TRAINING_AUGMENTATIONS};
use crate::embedder::{EmbedError, Embedder, decode_image};
use crate::model::{TrainedModel, TrainingMetadata};

/// Solver iteration cap; generous for the dataset sizes involved.
const MAX_ITERATIONS: u64 = 1000;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training requires at least two distinct labels, found {0}")]
    InsufficientData(usize),

    #[error("could not read {path:?}: {source}")]
    ReadSample {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("classifier fit failed: {0}")]
    Fit(#[from] linfa_logistic::error::Error),

    #[error("embedding matrix shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Decode, augment, and embed every sample, producing the training matrix
/// and one label per row. Augmented variants inherit the source label.
pub fn embed_training_set(
    embedder: &mut Embedder,
    samples: &[Sample],
) -> Result<(Array2<f64>, Vec<String>), TrainError> {
    let dim = embedder.dim();
    let mut rows: Vec<f64> = Vec::with_capacity(samples.len() * TRAINING_AUGMENTATIONS.len() * dim);
    let mut labels = Vec::with_capacity(samples.len() * TRAINING_AUGMENTATIONS.len());

    for sample in samples {
        let bytes = fs::read(&sample.path).map_err(|source| TrainError::ReadSample {
            path: sample.path.clone(),
            source,
        })?;
        let image = decode_image(&bytes)?;

        for augmentation in TRAINING_AUGMENTATIONS {
            let variant = augment::apply(&image, augmentation);
            let embedding = embedder.embed_image(&variant)?;
            rows.extend(embedding.iter().map(|&v| f64::from(v)));
            labels.push(sample.label.clone());
        }
        debug!(path = %sample.path.display(), label = %sample.label, "embedded sample");
    }

    let records = Array2::from_shape_vec((labels.len(), dim), rows)?;
    Ok((records, labels))
}

/// Fit a multinomial logistic regression over (embedding, label) pairs.
///
/// The label vocabulary is the sorted set of distinct labels, giving a
/// stable index-to-label mapping independent of sample order.
pub fn fit(records: Array2<f64>, labels: &[String]) -> Result<TrainedModel, TrainError> {
    let mut vocabulary: Vec<String> = labels.to_vec();
    vocabulary.sort();
    vocabulary.dedup();
    if vocabulary.len() < 2 {
        return Err(TrainError::InsufficientData(vocabulary.len()));
    }

    let index: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let targets: Array1<usize> = labels
        .iter()
        .map(|label| {
            *counts.entry(label.clone()).or_insert(0) += 1;
            index[label.as_str()]
        })
        .collect();

    let embedding_dim = records.ncols();
    let total_samples = records.nrows();

    let dataset = Dataset::new(records, targets);
    let classifier = MultiLogisticRegression::default()
        .max_iterations(MAX_ITERATIONS)
        .fit(&dataset)?;

    info!(
        classes = vocabulary.len(),
        samples = total_samples,
        dim = embedding_dim,
        "trained classifier"
    );

    let metadata = TrainingMetadata {
        trained_at: Utc::now(),
        embedding_dim,
        total_samples,
        samples_per_label: counts,
    };
    Ok(TrainedModel::new(classifier, vocabulary, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PredictError;

    /// Two well-separated clusters on the x axis, labeled Left/Right.
    fn separable_set() -> (Array2<f64>, Vec<String>) {
        let points = [
            ([-1.0, 0.2], "Left"),
            ([-0.9, -0.1], "Left"),
            ([-1.1, 0.0], "Left"),
            ([-0.8, 0.1], "Left"),
            ([1.0, -0.2], "Right"),
            ([0.9, 0.1], "Right"),
            ([1.1, 0.0], "Right"),
            ([0.8, -0.1], "Right"),
        ];
        let rows: Vec<f64> = points.iter().flat_map(|(p, _)| p.iter().copied()).collect();
        let labels = points.iter().map(|(_, l)| l.to_string()).collect();
        (Array2::from_shape_vec((points.len(), 2), rows).unwrap(), labels)
    }

    #[test]
    fn fit_two_classes_and_predict() {
        let (records, labels) = separable_set();
        let model = fit(records, &labels).unwrap();

        assert_eq!(model.labels(), ["Left", "Right"], "vocabulary is sorted");
        assert_eq!(model.embedding_dim(), 2);
        assert_eq!(model.metadata.total_samples, 8);
        assert_eq!(model.metadata.samples_per_label["Left"], 4);
        assert_eq!(model.metadata.samples_per_label["Right"], 4);

        assert_eq!(model.predict(&[-1.0, 0.0]).unwrap(), "Left");
        assert_eq!(model.predict(&[1.0, 0.0]).unwrap(), "Right");
    }

    #[test]
    fn fit_single_label_fails() {
        let records = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 0.1, 0.9]).unwrap();
        let labels = vec!["Frontal".to_string(), "Frontal".to_string()];
        let err = fit(records, &labels).unwrap_err();
        assert!(matches!(err, TrainError::InsufficientData(1)));
    }

    #[test]
    fn fit_three_classes() {
        let points = [
            ([1.0f64, 0.0, 0.0], "Frontal"),
            ([0.9, 0.1, 0.0], "Frontal"),
            ([0.0, 1.0, 0.0], "Left"),
            ([0.1, 0.9, 0.0], "Left"),
            ([0.0, 0.0, 1.0], "Upper"),
            ([0.0, 0.1, 0.9], "Upper"),
        ];
        let rows: Vec<f64> = points.iter().flat_map(|(p, _)| p.iter().copied()).collect();
        let labels: Vec<String> = points.iter().map(|(_, l)| l.to_string()).collect();
        let records = Array2::from_shape_vec((points.len(), 3), rows).unwrap();

        let model = fit(records, &labels).unwrap();
        assert_eq!(model.labels(), ["Frontal", "Left", "Upper"]);
        assert_eq!(model.predict(&[0.0, 0.0, 1.0]).unwrap(), "Upper");
    }

    #[test]
    fn predict_rejects_dimension_mismatch() {
        let (records, labels) = separable_set();
        let model = fit(records, &labels).unwrap();

        let err = model.predict(&[0.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            PredictError::DimensionMismatch {
                expected: 2,
                actual: 5
            }
        ));
    }

    #[test]
    fn artifact_serializes_round_trip() {
        let (records, labels) = separable_set();
        let model = fit(records, &labels).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: TrainedModel = serde_json::from_str(&json).unwrap();

        // Bit-for-bit label agreement on a fixed embedding.
        for probe in [[-1.0f32, 0.3], [0.7, -0.2], [0.0, 1.0]] {
            assert_eq!(
                model.predict(&probe).unwrap(),
                restored.predict(&probe).unwrap()
            );
        }
    }
}
