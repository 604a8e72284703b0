//! Atomic save/load of the fitted classifier plus a metadata sidecar.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dentaview_ai::TrainedModel;
use tempfile::NamedTempFile;
use tracing::info;

use crate::StoreError;

const ARTIFACT_FILE: &str = "trained_classifier.json";
const METADATA_FILE: &str = "trained_classifier.meta.json";

/// Owns the on-disk artifact: one serialized-classifier file plus a
/// human-readable metadata summary, both regenerated wholesale on every
/// save. Writes go to a temp file in the same directory and are renamed
/// into place, so a crash mid-write never leaves a half-written artifact
/// visible to `load`.
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Whether a persisted artifact exists. Says nothing about validity;
    /// a corrupt file still reports `true` and fails on `load`.
    pub fn exists(&self) -> bool {
        self.artifact_path().exists()
    }

    /// Persist an artifact, atomically replacing any previous one.
    pub fn save(&self, model: &TrainedModel) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let payload = serde_json::to_vec(model)?;
        write_atomic(&self.dir, &self.artifact_path(), &payload)?;

        let summary = serde_json::to_vec_pretty(&model.metadata)?;
        write_atomic(&self.dir, &self.metadata_path(), &summary)?;

        info!(
            path = %self.artifact_path().display(),
            classes = model.labels().len(),
            "saved classifier artifact"
        );
        Ok(())
    }

    /// Load the persisted artifact. Corruption is not repaired; the caller
    /// must retrain.
    pub fn load(&self) -> Result<TrainedModel, StoreError> {
        let path = self.artifact_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path));
            }
            Err(err) => return Err(err.into()),
        };

        let model: TrainedModel = serde_json::from_slice(&bytes)?;
        info!(
            path = %path.display(),
            classes = model.labels().len(),
            "loaded classifier artifact"
        );
        Ok(model)
    }
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(target).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dentaview_ai::trainer;
    use ndarray::Array2;

    fn toy_model(left: &str, right: &str) -> TrainedModel {
        let rows = vec![-1.0, 0.0, -0.9, 0.1, 1.0, 0.0, 0.9, -0.1];
        let records = Array2::from_shape_vec((4, 2), rows).unwrap();
        let labels = vec![
            left.to_string(),
            left.to_string(),
            right.to_string(),
            right.to_string(),
        ];
        trainer::fit(records, &labels).unwrap()
    }

    #[test]
    fn save_then_load_round_trips_predictions() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path());
        let model = toy_model("Left", "Right");

        assert!(!store.exists());
        store.save(&model).unwrap();
        assert!(store.exists());

        let restored = store.load().unwrap();
        assert_eq!(restored.labels(), model.labels());
        for probe in [[-1.0f32, 0.2], [0.8, -0.3], [0.0, 0.0]] {
            assert_eq!(
                restored.predict(&probe).unwrap(),
                model.predict(&probe).unwrap()
            );
        }
    }

    #[test]
    fn metadata_sidecar_is_written() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path());
        store.save(&toy_model("Left", "Right")).unwrap();

        let summary = fs::read_to_string(store.metadata_path()).unwrap();
        assert!(summary.contains("embedding_dim"));
        assert!(summary.contains("samples_per_label"));
    }

    #[test]
    fn load_without_artifact_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path());
        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn load_corrupt_artifact_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path());
        fs::write(store.artifact_path(), b"{ not json").unwrap();

        assert!(store.exists());
        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn save_replaces_previous_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path());

        store.save(&toy_model("Left", "Right")).unwrap();
        store.save(&toy_model("Lower", "Upper")).unwrap();

        let restored = store.load().unwrap();
        assert_eq!(restored.labels(), ["Lower", "Upper"]);
    }

    #[test]
    fn save_into_missing_directory_creates_it() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ModelStore::new(tmp.path().join("nested/model"));
        store.save(&toy_model("Left", "Right")).unwrap();
        assert!(store.load().is_ok());
    }
}
