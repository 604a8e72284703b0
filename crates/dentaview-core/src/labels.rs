//! The five-class camera-angle taxonomy and the Left/Right relabel rule.
//!
//! Treatment phase is deliberately not part of the label: pre- and
//! post-treatment photos of the same angle share a class, keeping the label
//! space at five values under the primary layout.

/// Camera-angle folder names under the primary layout. These are the only
/// admissible labels for primary-layout datasets and must match the on-disk
/// folder names exactly.
pub const ANGLES: [&str; 5] = ["Frontal", "Left", "Lower", "Right", "Upper"];

/// Treatment-phase folder names under each case directory.
pub const TREATMENT_PHASES: [&str; 2] = ["preTreatment", "postTreatment"];

/// Swap `Left` and `Right` predictions, leaving every other label unchanged.
///
/// This is a deliberate business override for a known systematic
/// mislabeling in the upstream data. It is applied unconditionally after
/// prediction, regardless of confidence, and matches case-insensitively
/// while always emitting the canonical capitalized label.
pub fn apply_side_swap(label: &str) -> String {
    match label.to_ascii_lowercase().as_str() {
        "left" => "Right".to_string(),
        "right" => "Left".to_string(),
        _ => label.to_string(),
    }
}
