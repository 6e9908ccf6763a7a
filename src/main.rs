use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod cninfo;
mod commands;
mod domain;
mod services;

use cli::Cli;
use commands::{handle_inspect_commands, handle_run_command};
use services::settings::load_settings;

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }

    if handle_run_command(&cli, &settings)? {
        return Ok(());
    }
    handle_inspect_commands(&cli, &settings)?;
    Ok(())
}
