use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            commands::run::execute(cli.config.as_deref(), cli.log_level.as_deref(), args).await
        }
        Commands::Config { action } => commands::config::execute(action),
    }
}
