//! The `inspoflow analyze` command.

use clap::Args;
use inspoflow_core::{AnalysisResult, Config, VisionClient};
use std::path::PathBuf;

use super::{analyze_with_retry, print_json, read_image, Spinner};

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Screenshot to analyze (PNG, JPEG, WebP, GIF or BMP)
    pub image: PathBuf,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the analyze command.
///
/// On failure the error-category result is still printed so callers that
/// only read stdout have something to show.
pub async fn execute(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let bytes = read_image(&args.image)?;
    let client = VisionClient::from_config(&config.vision)?;
    let pretty = args.pretty || config.output.pretty;

    tracing::info!("Analyzing {}", args.image.display());
    let spinner = Spinner::follow(&client, "Reading text...");
    let outcome = analyze_with_retry(&client, &bytes, &config.pipeline).await;
    spinner.finish();

    match outcome {
        Ok(result) => print_json(&result, pretty),
        Err(e) => {
            print_json(&AnalysisResult::failed(&e), pretty)?;
            Err(e.into())
        }
    }
}
