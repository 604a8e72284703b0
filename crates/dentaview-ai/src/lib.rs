//! AI layer: ONNX image embeddings and multinomial logistic-regression training.

pub mod augment;
pub mod embedder;
pub mod model;
pub mod trainer;

pub use augment::{Augmentation, TRAINING_AUGMENTATIONS};
pub use embedder::{EmbedError, Embedder, decode_image};
pub use model::{PredictError, TrainedModel, TrainingMetadata};
pub use trainer::{TrainError, embed_training_set, fit};
