//! Run the americano server in the foreground
//!
//! The question bank starts empty; load it with `POST /adaptive/questions`.

use americano_server::{AmericanoServer, AppState};
use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::ConfigLoader;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let state = AppState::from_config(config.adaptive, config.extraction, &config.resilience)?;
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            shutdown.cancel();
        }
    });

    info!("Starting americano server on {}", config.server.addr());
    AmericanoServer::new(config.server, state).run().await?;
    Ok(())
}
