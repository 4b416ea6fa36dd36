use std::{sync::Arc, time::Duration};

use clap::Parser;
use generator::cli::Cli;
use generator::history::{FileHistory, HistoryCache, RemoteHistory};
use generator::server;
use generator::service::Service;
use generator::NumberGenerator;
use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let generator = match cli.seed {
        Some(seed) => {
            info!("Seeding generator with {}", seed);
            NumberGenerator::seeded(seed)
        }
        None => NumberGenerator::from_os_rng(),
    };
    let expiry = Duration::from_secs(cli.cache_secs);
    let history = match (cli.history, cli.history_url) {
        (Some(path), _) => Some(HistoryCache::new(FileHistory::new(path), expiry)),
        (None, Some(url)) => {
            info!("Using the last {} draws from {}", cli.history_draws, url);
            Some(HistoryCache::new(
                RemoteHistory::new(&url, cli.history_draws)?,
                expiry,
            ))
        }
        (None, None) => None,
    };
    let service = Arc::new(Service::new(generator, history));

    let listener = TcpListener::bind(&cli.bind).await?;
    server::serve(listener, service).await?;

    Ok(())
}
