//! Shared configuration: data roots and model locations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Filesystem layout the pipeline operates on. Defaults match the
/// conventional working-directory layout; the CLI overrides them per flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Primary training root: `<root>/<case>/{preTreatment,postTreatment}/<Angle>/`.
    pub primary_root: PathBuf,
    /// Fallback training root: one subdirectory per label.
    pub fallback_root: PathBuf,
    /// Directory containing the ONNX image encoder (`visual.onnx`).
    pub embed_model_dir: PathBuf,
    /// Directory holding the persisted classifier artifact.
    pub model_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            primary_root: PathBuf::from("output"),
            fallback_root: PathBuf::from("labeled_samples"),
            embed_model_dir: PathBuf::from("models/clip-vit-b32"),
            model_dir: PathBuf::from("."),
        }
    }
}
