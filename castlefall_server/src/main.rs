mod config;
mod connection;
mod error;
mod hub;
mod server;

use castlefall_core::WordLists;
use clap::Parser;
use config::Cli;
use log::{error, info, warn};

fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let lists = WordLists::load_dir(&cli.wordlists)?;
    if lists.is_empty() {
        warn!("no word lists found in {}", cli.wordlists.display());
    } else {
        info!(
            "loaded {} word lists from {}",
            lists.len(),
            cli.wordlists.display()
        );
    }
    server::run(cli.addr(), lists).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        error!("{e}");
        std::process::exit(1);
    }
}
