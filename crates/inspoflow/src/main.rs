//! InspoFlow CLI - turn screenshots into titled, tagged, searchable inspiration.
//!
//! Screenshots are read by a cloud OCR provider and the detected text is
//! classified into a title, summary and link. Results can be printed or
//! saved to a Supabase project together with the screenshot.
//!
//! # Usage
//!
//! ```bash
//! # Analyze a screenshot and print the result
//! inspoflow analyze shot.png
//!
//! # Classify a saved DetectText response without calling the provider
//! inspoflow classify response.json
//!
//! # Analyze, upload and save
//! inspoflow ingest shot.png
//!
//! # Browse saved items
//! inspoflow items search "design system"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// InspoFlow - turn screenshots into titled, tagged, searchable inspiration.
#[derive(Parser, Debug)]
#[command(name = "inspoflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "INSPOFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a screenshot and print the result as JSON
    Analyze(cli::analyze::AnalyzeArgs),

    /// Classify a saved DetectText response offline
    Classify(cli::classify::ClassifyArgs),

    /// Analyze a screenshot, upload it and save the item
    Ingest(cli::ingest::IngestArgs),

    /// List, search and delete saved items
    Items(cli::items::ItemsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match &cli.config {
        Some(path) => inspoflow_core::Config::load_from(path)?,
        None => match inspoflow_core::Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `inspoflow config path`."
                );
                inspoflow_core::Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("InspoFlow v{}", inspoflow_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, &config).await,
        Commands::Classify(args) => cli::classify::execute(args, &config).await,
        Commands::Ingest(args) => cli::ingest::execute(args, &config).await,
        Commands::Items(args) => cli::items::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config, cli.config.as_deref()).await,
    }
}
