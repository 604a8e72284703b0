//! Labeled training-image discovery under the two supported directory layouts.
//!
//! Layouts are tried in rank order, each a pure function from a filesystem
//! listing to a sample set:
//!
//! 1. Primary: `output/<case>/{preTreatment,postTreatment}/<Angle>/*`,
//!    label = angle folder name (fixed five-angle taxonomy, phases merged).
//! 2. Fallback: `labeled_samples/<label>/*`, label = parent folder name
//!    (open vocabulary).
//!
//! Non-image files are skipped by extension. If neither layout yields a
//! sample, discovery fails with [`DatasetError::NotFound`].

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::DataConfig;
use crate::labels::{ANGLES, TREATMENT_PHASES};

/// Admissible image extensions, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no training images found under {primary:?} or {fallback:?}")]
    NotFound { primary: PathBuf, fallback: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which directory convention a training run is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Primary,
    Fallback,
}

/// Resolved training-data layout: the convention plus its root directory.
#[derive(Debug, Clone)]
pub struct Layout {
    pub kind: LayoutKind,
    pub root: PathBuf,
}

/// One labeled training image, label derived from its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: String,
}

/// Enumerate labeled images, trying the primary layout first and falling
/// back to the flat labeled-samples layout if the primary yields nothing.
///
/// Samples are sorted by path so a training run over the same tree is
/// deterministic.
pub fn discover_samples(config: &DataConfig) -> Result<(Layout, Vec<Sample>), DatasetError> {
    let mut samples = primary_samples(&config.primary_root)?;
    if !samples.is_empty() {
        samples.sort_by(|a, b| a.path.cmp(&b.path));
        info!(
            count = samples.len(),
            root = %config.primary_root.display(),
            "discovered primary-layout training data"
        );
        return Ok((
            Layout {
                kind: LayoutKind::Primary,
                root: config.primary_root.clone(),
            },
            samples,
        ));
    }

    let mut samples = fallback_samples(&config.fallback_root)?;
    if !samples.is_empty() {
        samples.sort_by(|a, b| a.path.cmp(&b.path));
        info!(
            count = samples.len(),
            root = %config.fallback_root.display(),
            "discovered fallback-layout training data"
        );
        return Ok((
            Layout {
                kind: LayoutKind::Fallback,
                root: config.fallback_root.clone(),
            },
            samples,
        ));
    }

    Err(DatasetError::NotFound {
        primary: config.primary_root.clone(),
        fallback: config.fallback_root.clone(),
    })
}

/// Determine which layout a train call would use, without keeping the
/// samples. `None` means neither root yields any labeled image.
pub fn probe_layout(config: &DataConfig) -> Option<Layout> {
    discover_samples(config).ok().map(|(layout, _)| layout)
}

/// Enumerate `<root>/<case>/<phase>/<Angle>/*` image files. The label is the
/// angle folder name; the treatment phase is not part of the label.
fn primary_samples(root: &Path) -> Result<Vec<Sample>, DatasetError> {
    let mut samples = Vec::new();
    if !root.is_dir() {
        return Ok(samples);
    }

    for case_entry in fs::read_dir(root)? {
        let case_path = case_entry?.path();
        if !case_path.is_dir() {
            continue;
        }
        for phase in TREATMENT_PHASES {
            for angle in ANGLES {
                let class_dir = case_path.join(phase).join(angle);
                if !class_dir.is_dir() {
                    continue;
                }
                collect_images(&class_dir, angle, &mut samples)?;
            }
        }
    }

    Ok(samples)
}

/// Enumerate `<root>/<label>/*` image files; the label is the immediate
/// parent folder name.
fn fallback_samples(root: &Path) -> Result<Vec<Sample>, DatasetError> {
    let mut samples = Vec::new();
    if !root.is_dir() {
        return Ok(samples);
    }

    for label_entry in fs::read_dir(root)? {
        let label_path = label_entry?.path();
        if !label_path.is_dir() {
            continue;
        }
        let Some(label) = label_path.file_name().and_then(OsStr::to_str) else {
            continue;
        };
        let label = label.to_string();
        collect_images(&label_path, &label, &mut samples)?;
    }

    Ok(samples)
}

fn collect_images(dir: &Path, label: &str, samples: &mut Vec<Sample>) -> Result<(), DatasetError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            samples.push(Sample {
                path,
                label: label.to_string(),
            });
        } else {
            debug!(path = %path.display(), "skipping non-image entry");
        }
    }
    Ok(())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
