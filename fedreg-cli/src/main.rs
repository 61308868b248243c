//! Federation Registry CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use fedreg_api::{listen_for_signals, serve, ShutdownSignal};
use fedreg_config::load_config;
use fedreg_registry::Registry;
use fedreg_store::Database;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fedreg")]
#[command(about = "Federation Registry", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the REST API
    Serve {
        /// Path to configuration file (built-in defaults when omitted)
        #[arg(short, long, env = "FEDREG_CONFIG")]
        config: Option<PathBuf>,

        /// Log level (trace, debug, info, warn, error), overrides the configuration
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Print the effective configuration as JSON
        #[arg(long)]
        print: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, log_level } => {
            let config = load_config(config.as_ref(), true)?;

            let level = log_level.unwrap_or_else(|| config.observability.log_level.clone());
            init_tracing(&level, config.observability.json_logs)?;

            tracing::info!("Starting Federation Registry");
            tracing::info!(
                listen = %config.server.listen,
                prefix = %config.server.api_prefix,
                auth = config.auth.enabled(),
                "Configuration loaded"
            );

            let db = Database::open(&config.storage).await?;
            tracing::info!(backend = db.backend_name(), "Storage opened");
            let registry = Registry::new(Arc::new(db));

            let shutdown = ShutdownSignal::new();
            tokio::spawn(listen_for_signals(shutdown.clone()));

            serve(&config, registry, shutdown).await?;

            tracing::info!("Federation Registry stopped");
            Ok(())
        }

        Commands::Validate { config, print } => {
            init_tracing("warn", false)?;

            let cfg = match load_config(Some(&config), true) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("{}: invalid configuration: {e}", config.display());
                    std::process::exit(1);
                }
            };

            println!("{}: configuration is valid", config.display());
            println!("  listen:     {}", cfg.server.listen);
            println!("  api prefix: {}", cfg.server.api_prefix);
            println!("  storage:    {:?}", cfg.storage.backend);
            println!("  auth:       {}", if cfg.auth.enabled() { "jwt" } else { "disabled" });
            if print {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            }
            Ok(())
        }

        Commands::Version => {
            println!(
                "fedreg {} (rust {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_RUST_VERSION")
            );
            Ok(())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{level}': {e}"))?
            .add_directive("hyper=warn".parse()?),
    };

    let fmt = tracing_subscriber::fmt::layer().with_target(false);
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt.json().flatten_event(true))
            .try_init()?;
    } else {
        tracing_subscriber::registry().with(filter).with(fmt).try_init()?;
    }
    Ok(())
}
