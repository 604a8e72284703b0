//! ONNX Runtime embedding pipeline for CLIP-style image encoders.
//!
//! Produces L2-normalized embeddings from a frozen visual encoder
//! (e.g., CLIP ViT-B/32 exported to ONNX, 512 dimensions). The model
//! directory must contain `visual.onnx`.

use std::path::Path;

use image::DynamicImage;
use image::imageops::FilterType;
use ort::session::Session;
use ort::value::Tensor;
use thiserror::Error;
use tracing::info;

/// Input resolution expected by the visual encoder.
const INPUT_SIZE: u32 = 224;

/// Per-channel normalization constants from the CLIP preprocessing recipe.
const CHANNEL_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const CHANNEL_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("{0}")]
    Model(String),
}

/// Decode raw upload bytes into an image. Fails with [`EmbedError::Decode`]
/// if the bytes are not a supported image format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, EmbedError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Image embedding generator using ONNX Runtime.
///
/// The session is frozen: identical weights and identical input bytes
/// always produce the same vector. Execution-provider selection happens
/// once at load time and holds for the life of the process.
pub struct Embedder {
    session: Session,
    dim: usize,
}

impl Embedder {
    /// Load the visual encoder from a directory containing `visual.onnx`.
    ///
    /// With the `cuda` feature enabled, the CUDA execution provider is
    /// registered when available; otherwise inference runs on CPU.
    pub fn load(model_dir: &Path) -> Result<Self, EmbedError> {
        let model_path = model_dir.join("visual.onnx");
        if !model_path.exists() {
            return Err(EmbedError::Model(format!(
                "visual.onnx not found in {}",
                model_dir.display()
            )));
        }

        #[allow(unused_mut)]
        let mut builder = Session::builder()?;

        #[cfg(feature = "cuda")]
        {
            use ort::execution_providers::{CUDAExecutionProvider, ExecutionProvider};
            let cuda = CUDAExecutionProvider::default();
            if cuda.is_available().unwrap_or(false) {
                builder = builder.with_execution_providers([cuda.build()])?;
                info!("registered CUDA execution provider");
            } else {
                info!("CUDA unavailable, running on CPU");
            }
        }

        let session = builder.commit_from_file(&model_path)?;

        // Infer embedding dimension from the model output shape.
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(512);

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self { session, dim })
    }

    /// Embedding dimensionality (512 for CLIP ViT-B/32).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Decode and embed raw image bytes.
    pub fn embed_bytes(&mut self, bytes: &[u8]) -> Result<Vec<f32>, EmbedError> {
        let image = decode_image(bytes)?;
        self.embed_image(&image)
    }

    /// Embed a decoded image, returning a normalized vector.
    pub fn embed_image(&mut self, image: &DynamicImage) -> Result<Vec<f32>, EmbedError> {
        let pixels = preprocess(image);
        let shape = [1i64, 3, INPUT_SIZE as i64, INPUT_SIZE as i64];
        let tensor = Tensor::from_array((shape, pixels.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["pixel_values" => tensor])?;

        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        if output_data.len() != self.dim {
            return Err(EmbedError::Model(format!(
                "unexpected output shape {dims:?}, expected [1, {}]",
                self.dim
            )));
        }

        let mut embedding = output_data.to_vec();
        normalize(&mut embedding);
        Ok(embedding)
    }
}

/// CLIP preprocessing: aspect-preserving resize and center crop to
/// 224x224, scale to [0, 1], per-channel mean/std normalization. Output is
/// a flat NCHW buffer.
fn preprocess(image: &DynamicImage) -> Vec<f32> {
    let resized = image
        .resize_to_fill(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
        .to_rgb8();

    let hw = (INPUT_SIZE * INPUT_SIZE) as usize;
    let mut pixels = vec![0.0f32; 3 * hw];
    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            pixels[c * hw + i] = (pixel.0[c] as f32 / 255.0 - CHANNEL_MEAN[c]) / CHANNEL_STD[c];
        }
    }
    pixels
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Try to infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Last dimension is the embedding dim.
            shape
                .last()
                .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
        }
        _ => None,
    }
}
