//! Training and inference pipeline: the model cache and the three service
//! operations (`train`, `classify`, `status`).
//!
//! The pipeline owns the process-wide model cache: a single-slot container
//! set by a successful train, lazily filled from the store on first
//! classify, and replaced atomically (readers clone the `Arc`, so none ever
//! observes a half-constructed artifact). The slot is never cleared short
//! of process restart.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use dentaview_core::config::DataConfig;
use dentaview_core::dataset::{self, DatasetError};
use dentaview_core::labels::apply_side_swap;
use dentaview_ai::embedder::{EmbedError, Embedder};
use dentaview_ai::model::{PredictError, TrainedModel};
use dentaview_ai::trainer::{self, TrainError};
use dentaview_store::{ModelStore, StoreError};

/// User-facing error taxonomy. Every failure mode of the two operations
/// maps to exactly one variant; nothing is swallowed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error("model not trained yet; run train first")]
    ModelNotTrained,

    #[error("embedding dimension {actual} does not match the trained model ({expected}); retrain")]
    ModelMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
pub struct TrainReport {
    pub classes: Vec<String>,
    pub samples_per_label: BTreeMap<String, usize>,
    pub total_samples: usize,
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub model_present: bool,
}

/// Long-lived pipeline state: configuration, the artifact store, the
/// lazily-built embedder, and the in-memory model cache.
pub struct Pipeline {
    config: DataConfig,
    store: ModelStore,
    embedder: OnceCell<Mutex<Embedder>>,
    active: RwLock<Option<Arc<TrainedModel>>>,
}

impl Pipeline {
    pub fn new(config: DataConfig) -> Self {
        let store = ModelStore::new(&config.model_dir);
        Self {
            config,
            store,
            embedder: OnceCell::new(),
            active: RwLock::new(None),
        }
    }

    /// The embedder is constructed on first use, so the accelerator probe
    /// inside [`Embedder::load`] runs once per process.
    fn embedder(&self) -> Result<&Mutex<Embedder>, ServiceError> {
        self.embedder
            .get_or_try_init(|| Embedder::load(&self.config.embed_model_dir).map(Mutex::new))
            .map_err(ServiceError::Embed)
    }

    /// Train a classifier from the labeled directory tree, persist it, and
    /// swap it into the cache.
    ///
    /// All-or-nothing: any failure before the final swap leaves the
    /// previous persisted and cached model untouched.
    pub fn train(&self) -> Result<TrainReport, ServiceError> {
        let (layout, samples) = dataset::discover_samples(&self.config)?;
        info!(
            samples = samples.len(),
            layout = ?layout.kind,
            "starting training run"
        );

        let embedder = self.embedder()?;
        let (records, labels) = {
            let mut embedder = embedder.lock().unwrap_or_else(|e| e.into_inner());
            trainer::embed_training_set(&mut embedder, &samples)?
        };
        let model = trainer::fit(records, &labels)?;

        // Persist first; only a fully saved artifact replaces the cache.
        self.store.save(&model)?;

        let report = TrainReport {
            classes: model.labels().to_vec(),
            samples_per_label: model.metadata.samples_per_label.clone(),
            total_samples: model.metadata.total_samples,
        };

        let model = Arc::new(model);
        *self.active.write().unwrap_or_else(|e| e.into_inner()) = Some(model);

        info!(
            classes = report.classes.len(),
            total = report.total_samples,
            "training complete"
        );
        Ok(report)
    }

    /// Classify one uploaded image, returning the final label after the
    /// Left/Right relabel rule. Never mutates persisted state.
    pub fn classify(&self, bytes: &[u8]) -> Result<String, ServiceError> {
        let model = self.active_model()?;

        let embedding = {
            let embedder = self.embedder()?;
            let mut embedder = embedder.lock().unwrap_or_else(|e| e.into_inner());
            embedder.embed_bytes(bytes)?
        };

        if embedding.len() != model.embedding_dim() {
            return Err(ServiceError::ModelMismatch {
                expected: model.embedding_dim(),
                actual: embedding.len(),
            });
        }

        let raw = model.predict(&embedding)?;
        let label = apply_side_swap(&raw);
        if label != raw {
            info!(%raw, %label, "applied side-swap relabel");
        }
        Ok(label)
    }

    pub fn status(&self) -> ModelStatus {
        let cached = self
            .active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some();
        ModelStatus {
            model_present: cached || self.store.exists(),
        }
    }

    /// Cache read path: UNSET transitions to LOADED via the store on first
    /// use; an empty store surfaces as [`ServiceError::ModelNotTrained`].
    fn active_model(&self) -> Result<Arc<TrainedModel>, ServiceError> {
        if let Some(model) = self
            .active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
        {
            return Ok(Arc::clone(model));
        }

        let model = match self.store.load() {
            Ok(model) => Arc::new(model),
            Err(StoreError::NotFound(_)) => return Err(ServiceError::ModelNotTrained),
            Err(err) => return Err(err.into()),
        };

        let mut slot = self.active.write().unwrap_or_else(|e| e.into_inner());
        // A concurrent train may have landed first; keep whichever is set.
        let model = slot.get_or_insert(model);
        Ok(Arc::clone(model))
    }
}
