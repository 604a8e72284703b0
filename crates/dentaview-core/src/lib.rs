pub mod config;
pub mod dataset;
pub mod labels;

pub use config::DataConfig;
pub use dataset::{DatasetError, Layout, LayoutKind, Sample, discover_samples, probe_layout};
pub use labels::{ANGLES, TREATMENT_PHASES, apply_side_swap};
