use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use treesync::{Config, Endpoint, EndpointRegistry, LocalTransport, SyncAddress};

#[derive(Parser)]
#[command(name = "treesync")]
#[command(about = "Continuous bidirectional directory synchronization over a git transport")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate endpoint addresses and report merge compatibility
    Check {
        /// Endpoint addresses ([[user@]host:]path)
        #[arg(required = true)]
        endpoints: Vec<String>,
    },

    /// Terminate the daemons recorded for a synced root
    Stop {
        /// Local sync root whose daemons should be stopped
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Check { endpoints } => cmd_check(&config, &endpoints).await,
        Commands::Stop { path } => cmd_stop(&config, &path).await,
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Parse each address, probe the local endpoints, and report whether the
/// sides can merge. Malformed addresses and incompatible histories fail
/// the command without aborting the remaining checks; probe failures are
/// fatal immediately.
async fn cmd_check(config: &Config, addresses: &[String]) -> Result<()> {
    let transport = Arc::new(LocalTransport::new()?);
    let registry = EndpointRegistry::new();
    let mut had_errors = false;

    for raw in addresses {
        let expanded = shellexpand::full(raw)
            .with_context(|| format!("failed to expand address [{raw}]"))?;
        let address = match SyncAddress::parse(&expanded) {
            Ok(address) => address,
            Err(err) => {
                error!("{err}");
                had_errors = true;
                continue;
            }
        };
        if address.is_remote() {
            warn!(
                "{}@{}:{}: no remote transport configured; skipping probes",
                address.username, address.hostname, address.path
            );
            continue;
        }
        let endpoint = Arc::new(Endpoint::new(
            address,
            transport.clone(),
            config.engine.clone(),
        ));
        registry.register(&endpoint);
    }

    let endpoints = registry.endpoints();
    for endpoint in &endpoints {
        let installed = endpoint.has_engine_installed().await?;
        endpoint.refresh_tail_hash().await?;
        let tail = endpoint.tail_hash();
        println!(
            "{} branch={} engine={} repo={}",
            endpoint.describe(),
            endpoint.branch_name(),
            if installed { "ok" } else { "missing" },
            if tail.is_empty() { "none" } else { tail.as_str() },
        );
    }

    for pair in endpoints.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.is_compatible_with(b) {
            info!("{} and {} can merge", a.describe(), b.describe());
        } else {
            error!(
                "{} and {} have unrelated repository histories and cannot merge",
                a.describe(),
                b.describe()
            );
            had_errors = true;
        }
    }

    if had_errors {
        bail!("one or more endpoints failed validation");
    }
    Ok(())
}

/// Stop every daemon scoped to the given sync root
async fn cmd_stop(config: &Config, path: &str) -> Result<()> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("failed to expand path [{path}]"))?;
    let address = SyncAddress::parse(&expanded)?;
    if address.is_remote() {
        bail!("stop only operates on local sync roots");
    }

    let transport = Arc::new(LocalTransport::new()?);
    let endpoint = Endpoint::new(address, transport, config.engine.clone());
    endpoint.kill_all_via_pidfiles().await?;
    info!("daemon cleanup finished for {}", endpoint.describe());
    Ok(())
}
