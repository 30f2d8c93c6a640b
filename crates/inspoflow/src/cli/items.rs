//! The `inspoflow items` command for browsing saved items.

use clap::{Args, Subcommand};
use inspoflow_core::{Config, ItemStore, RestStore, SavedItem};
use uuid::Uuid;

use super::print_json;

/// Arguments for the `items` command.
#[derive(Args, Debug)]
pub struct ItemsArgs {
    #[command(subcommand)]
    pub command: ItemsCommand,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

/// Subcommands for saved items.
#[derive(Subcommand, Debug)]
pub enum ItemsCommand {
    /// List all items, newest first
    List {
        /// Show at most this many items
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Search titles and summaries (case-insensitive)
    Search {
        /// Text to look for
        query: String,
    },

    /// Delete an item by id
    Delete {
        /// Item id
        id: Uuid,
    },
}

/// Execute the items command.
pub async fn execute(args: ItemsArgs, config: &Config) -> anyhow::Result<()> {
    let store = RestStore::from_config(&config.storage)?;
    let pretty = args.pretty || config.output.pretty;

    match args.command {
        ItemsCommand::List { limit } => {
            let items = truncate(store.list().await?, limit);
            print_json(&items, pretty)?;
        }

        ItemsCommand::Search { query } => {
            let items = store.search(&query).await?;
            tracing::info!("{} item(s) match {query:?}", items.len());
            print_json(&items, pretty)?;
        }

        ItemsCommand::Delete { id } => {
            store.delete(id).await?;
            println!("Deleted {id}");
        }
    }

    Ok(())
}

fn truncate(mut items: Vec<SavedItem>, limit: Option<usize>) -> Vec<SavedItem> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}
