//! The `inspoflow ingest` command.

use clap::Args;
use inspoflow_core::{Config, IngestOutcome, Ingestor, MemoryStore, VisionClient};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use super::{analyze_with_retry, print_json, read_image, Spinner};

/// Arguments for the `ingest` command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Screenshot to ingest
    pub image: PathBuf,

    /// Analyze and build the item, but keep it in memory instead of saving
    #[arg(long)]
    pub dry_run: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the ingest command.
pub async fn execute(args: IngestArgs, config: &Config) -> anyhow::Result<()> {
    let bytes = read_image(&args.image)?;
    let pretty = args.pretty || config.output.pretty;

    let ingestor = if args.dry_run {
        tracing::info!("Dry run: nothing will be uploaded or saved");
        let store = Arc::new(MemoryStore::new());
        Ingestor::new(VisionClient::from_config(&config.vision)?, store.clone(), store)
    } else {
        Ingestor::from_config(config)?
    };

    let spinner = Spinner::follow(ingestor.vision(), "Reading text...");
    let analysis = analyze_with_retry(ingestor.vision(), &bytes, &config.pipeline).await;
    spinner.finish();
    let analysis = analysis?;

    match ingestor.save_analysis(&analysis, &bytes).await? {
        IngestOutcome::Saved(item) => print_json(&item, pretty),
        IngestOutcome::Duplicate { url } => {
            eprintln!("Already saved: {url}");
            print_json(&json!({ "duplicate": true, "url": url }), pretty)
        }
    }
}
