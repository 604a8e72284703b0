//! Training-time augmentation to stretch a small labeled dataset.
//!
//! Every training image contributes one embedding per variant in
//! [`TRAINING_AUGMENTATIONS`]. Augmentation is strictly a training-set
//! concern; inference always sees the raw upload.

use image::DynamicImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    Identity,
    Mirror,
    Brighten,
    Contrast,
}

/// Variants generated for every training image, identity included.
pub const TRAINING_AUGMENTATIONS: [Augmentation; 4] = [
    Augmentation::Identity,
    Augmentation::Mirror,
    Augmentation::Brighten,
    Augmentation::Contrast,
];

/// Apply one augmentation, returning a new image.
pub fn apply(image: &DynamicImage, augmentation: Augmentation) -> DynamicImage {
    match augmentation {
        Augmentation::Identity => image.clone(),
        Augmentation::Mirror => image.fliph(),
        Augmentation::Brighten => image.brighten(25),
        Augmentation::Contrast => image.adjust_contrast(20.0),
    }
}
