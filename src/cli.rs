use crate::domain::models::Category;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "cninfo-watch",
    version,
    about = "Watch cninfo shareholder increase/decrease disclosures and push new records to a webhook"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "TOML settings file (defaults to ./cninfo-watch.toml when present)"
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Directory holding the per-category snapshot files"
    )]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, diff, notify and persist every selected category.
    Run {
        #[arg(long = "category", value_enum, help = "Restrict the run (repeatable)")]
        categories: Vec<Category>,
        #[arg(long, value_enum)]
        kind: Option<MessageKind>,
        #[arg(long)]
        window_days: Option<u32>,
        #[arg(long, help = "Treat this date as today (YYYY-MM-DD)")]
        as_of: Option<NaiveDate>,
        #[arg(long, env = "WECHAT_WEBHOOK", hide_env_values = true)]
        webhook: Option<String>,
        #[arg(long, env = "CNINFO_BASE_URL")]
        base_url: Option<String>,
    },
    /// List the monitored categories.
    Categories,
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
    /// Preview the message a category's stored snapshot would produce.
    Render {
        #[arg(value_enum)]
        category: Category,
        #[arg(long, value_enum)]
        kind: Option<MessageKind>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    Show {
        #[arg(value_enum)]
        category: Category,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    Clear {
        #[arg(value_enum)]
        category: Option<Category>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Markdown,
    Card,
}
