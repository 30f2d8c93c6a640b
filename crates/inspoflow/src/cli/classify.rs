//! The `inspoflow classify` command: classification without the provider.

use anyhow::Context;
use clap::Args;
use inspoflow_core::vision::decode_detections;
use inspoflow_core::{Config, TextClassifier};
use std::path::PathBuf;

use super::print_json;

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// A saved DetectText response body (`{"TextDetections": [...]}`)
    pub response: PathBuf,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: &Config) -> anyhow::Result<()> {
    let body = std::fs::read(&args.response)
        .with_context(|| format!("Failed to read {}", args.response.display()))?;
    let detections = decode_detections(&body)?;
    tracing::debug!("Loaded {} detections", detections.len());

    let result = TextClassifier::classify(&detections);
    print_json(&result, args.pretty || config.output.pretty)
}
