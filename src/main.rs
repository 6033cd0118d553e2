mod cache;
mod config;
mod contracts;
mod error;
mod logging;
mod oracle;
mod server;
mod soap;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "contract-gateway")]
#[command(about = "HTTP gateway for SOAP contract provisioning and Oracle listings")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./contract-gateway.yaml, then $XDG_CONFIG_HOME/contract-gateway/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Port to listen on
  #[arg(short, long)]
  port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(port) = args.port {
    config.server.port = port;
  }

  let _log_guard = logging::init_logging(&config.logging)?;

  info!(
    soap_url = %config.soap.url,
    oracle_url = %config.oracle.base_url,
    database = %config.database.redacted(),
    "Configuration loaded"
  );

  let state = server::AppState::new(&config)?;
  server::serve(config.server.port, state).await?;

  Ok(())
}
