use anyhow::Context;
use clap::Parser;
use log::info;
use service::routes::api;
use service::store::ServiceStore;
use std::path::PathBuf;
use tokio::signal;
use workflow::config::SimulatorConfig;
use workflow::runner::Runner;

mod generator;
mod service;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "In-memory multispectral analysis service for local development")]
struct Args {
    /// Load the simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Port to listen on (overrides the config file)
    #[arg(long)]
    port: Option<u16>,
    /// Milliseconds an analysis job stays `processing`
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Seed for the synthetic detection generator
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match args.config {
        Some(path) => SimulatorConfig::load(path)?,
        None => SimulatorConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.processing_delay_ms = delay_ms;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let runner = Runner::new(config.clone(), ServiceStore::shared());
    let (addr, server) = warp::serve(api(runner))
        .try_bind_with_graceful_shutdown(config.bind_address(), async {
            let _ = signal::ctrl_c().await;
        })
        .with_context(|| format!("binding {}", config.bind_address()))?;

    info!(
        "analysis service listening on http://{addr}/api (delay {} ms, seed {})",
        config.processing_delay_ms, config.seed
    );
    server.await;
    info!("analysis service stopped");
    Ok(())
}
