use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gateway_adapter::config::{flag_enabled, DEBUG_CURL_ENV};
use gateway_adapter::{resources, AdapterConfig, Error, GatewayClient};
use serde_json::json;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "ADAPTER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Gateway admin API base URL
    #[arg(long, env = "GATEWAY_URL", global = true)]
    gateway_url: Option<String>,

    /// Externally visible base URL of this adapter
    #[arg(long, env = "ADAPTER_URL", global = true)]
    adapter_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Query gateway info and status, then print availability and statistics
    Status,
    /// List composite APIs as JSON
    Apis,
    /// List consumers as JSON
    Consumers,
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    if let Commands::Version = args.command {
        println!("Gateway Adapter v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing(args.log_json);

    let config = load_config(&args)?;
    let client = GatewayClient::new(&config)?;
    info!("Using gateway admin API at {}", client.gateway_url());

    match args.command {
        Commands::Status => run_status(&client).await,
        Commands::Apis => {
            let apis = resources::list_apis(&client).await?;
            println!("{}", serde_json::to_string_pretty(&apis)?);
            Ok(())
        }
        Commands::Consumers => {
            let consumers = client.consumers().list().await?;
            println!("{}", serde_json::to_string_pretty(&consumers)?);
            Ok(())
        }
        Commands::Version => Ok(()),
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}

fn load_config(args: &Args) -> Result<AdapterConfig, Error> {
    let mut config = match &args.config {
        Some(path) => AdapterConfig::from_file(path)?,
        None => AdapterConfig::default(),
    };

    if let Some(url) = &args.gateway_url {
        config.gateway_url = url.clone();
    }
    if let Some(url) = &args.adapter_url {
        config.adapter_url = url.clone();
    }
    if let Ok(value) = std::env::var(DEBUG_CURL_ENV) {
        config.debug_curl = flag_enabled(&value);
    }

    config.validate()?;
    Ok(config)
}

async fn run_status(client: &GatewayClient) -> Result<(), Error> {
    let info = match client.gateway_info().await {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("Could not read gateway info: {}", e);
            None
        }
    };
    if let Err(e) = client.probe_status().await {
        warn!("Could not read gateway status: {}", e);
    }

    let report = json!({
        "gatewayUrl": client.gateway_url(),
        "adapterUrl": client.adapter_url(),
        "version": info.as_ref().and_then(|i| i.get("version")).cloned(),
        "availability": client.state().availability.snapshot(),
        "statistics": client.get_statistics(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
