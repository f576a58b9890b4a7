#[cfg(feature = "accelerate")]
extern crate accelerate_src;

#[cfg(feature = "mkl")]
extern crate intel_mkl_src;

mod cli;

use anyhow::Result;
use clap::Parser;
use emotion_classifier_pipelines::{EmotionPredictor, EMOTION_LABELS};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> Result<()> {
    let args = Cli::parse();

    // Logs go to stderr so stdout only carries the result
    let log_level = if args.verbose() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let predictor = EmotionPredictor::new(args.model(), &EMOTION_LABELS, args.predictor_options())
        .map_err(|e| {
            if e.is_model_load() {
                tracing::error!("Could not load the model '{}'", args.model());
            }
            e
        })?;
    let scores = predictor.classify(args.text())?;
    if let Some((label, score)) = scores.dominant() {
        tracing::debug!("Dominant emotion: {} ({})", label, score);
    }

    let output = if args.all() {
        scores
    } else {
        scores.to_dominant()
    };
    println!("{}", serde_json::to_string(&output)?);

    Ok(())
}
