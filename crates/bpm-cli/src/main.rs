mod cli;
mod workdir;

use std::env;
use std::sync::Arc;

use bpm_cache::CacheStore;
use bpm_core::{Config, Result};
use bpm_fetch::{Fetcher, GitRemoteFetcher};
use bpm_manifest::Manifester;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("starting bpm v{VERSION}");

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("bpm: error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Version => {
            println!("bpm {VERSION}");
            Ok(())
        }
        Command::Get { source, version } => get(&source, &version).await,
    }
}

async fn get(source: &str, version: &str) -> Result<()> {
    tracing::debug!(source, version, "resolving requirement");
    let config = Config::resolve()?;
    let work_dir = env::current_dir()?;

    let mut parent = workdir::load_working_bundle(&work_dir)?;

    let cache = Arc::new(CacheStore::new(
        config.cache_root.clone(),
        bpm_assemble::SimplePolicyParser,
    ));
    let remote: Arc<dyn bpm_core::RemoteFetcher> = Arc::new(GitRemoteFetcher::new());
    let fetcher = Fetcher::new(cache, remote);
    let manifester = Manifester::new(fetcher);

    let message = manifester.insert_requirement(&mut parent, source, version).await?;
    println!("{message}");

    manifester.upgrade(&work_dir, &parent)?;
    Ok(())
}
