use anyhow::Result;
use clap::Parser;
use log::info;

use yallanegev_export::cli::{Cli, Commands};
use yallanegev_export::commands;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    info!("Starting yallanegev-export");

    match cli.command {
        Commands::Export(args) => commands::export::run(args).await,
    }
}
