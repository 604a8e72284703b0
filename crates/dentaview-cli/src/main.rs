//! CLI entry point: train, classify, and status against a local data tree.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dentaview_core::config::DataConfig;
use dentaview_service::Pipeline;

#[derive(Parser)]
#[command(name = "dentaview", version, about = "Dental photo angle classification")]
struct Cli {
    /// Primary training root (case folders with pre/post-treatment angles).
    #[arg(long, env = "DENTAVIEW_PRIMARY_ROOT", default_value = "output")]
    primary_root: PathBuf,

    /// Fallback training root (one folder per label).
    #[arg(long, env = "DENTAVIEW_FALLBACK_ROOT", default_value = "labeled_samples")]
    fallback_root: PathBuf,

    /// Directory containing the ONNX image encoder (visual.onnx).
    #[arg(long, env = "DENTAVIEW_EMBED_MODEL", default_value = "models/clip-vit-b32")]
    embed_model_dir: PathBuf,

    /// Directory for the persisted classifier artifact.
    #[arg(long, env = "DENTAVIEW_MODEL_DIR", default_value = ".")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the classifier from the labeled directory tree and persist it.
    Train,
    /// Classify a single image and print its label.
    Classify { image: PathBuf },
    /// Report whether a trained model is present.
    Status,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("dentaview v{}", env!("CARGO_PKG_VERSION"));
    let cli = Cli::parse();

    let config = DataConfig {
        primary_root: cli.primary_root,
        fallback_root: cli.fallback_root,
        embed_model_dir: cli.embed_model_dir,
        model_dir: cli.model_dir,
    };
    let pipeline = Pipeline::new(config);

    match cli.command {
        Command::Train => {
            let report = pipeline.train().context("training failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Classify { image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("reading {}", image.display()))?;
            let label = pipeline.classify(&bytes)?;
            println!("{label}");
        }
        Command::Status => {
            let status = pipeline.status();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
