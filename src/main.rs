use clap::{Parser, Subcommand};
use outage_aggregator::aggregator::Aggregator;
use outage_aggregator::app::ports::KeyValueStore;
use outage_aggregator::apis::build_adapters;
use outage_aggregator::cache::AggregationCache;
use outage_aggregator::config::Config;
use outage_aggregator::infra::ReqwestHttp;
use outage_aggregator::logging;
use outage_aggregator::observability;
use outage_aggregator::server::{self, OutagesResponse};
use outage_aggregator::storage::{InMemoryStore, SqliteStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "outage_aggregator")]
#[command(about = "Ukrainian power outage aggregator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one aggregation cycle and print the snapshot
    Refresh {
        /// Ignore a fresh cache and query every source
        #[arg(long)]
        force: bool,
    },
    /// Print the cached snapshot without touching the network
    Cached,
    /// Probe every configured source
    Health,
    /// Run the HTTP API with a background refresh loop
    Serve {
        /// Overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_aggregator(config: &Config) -> anyhow::Result<Aggregator> {
    let store: Arc<dyn KeyValueStore> = match &config.cache.db_path {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => {
            warn!("No cache.db_path configured, snapshot cache will not survive restarts");
            Arc::new(InMemoryStore::new())
        }
    };
    // Transport ceiling only; per-adapter timeouts are applied by the aggregator
    let http = Arc::new(ReqwestHttp::new(&config.fetch.user_agent, config.adapter_timeout() * 2)?);
    let adapters = build_adapters(config, http);
    let cache = AggregationCache::new(store, config.cache_ttl());

    Ok(Aggregator::new(adapters, cache)
        .with_adapter_timeout(config.adapter_timeout())
        .with_probe_timeout(config.probe_timeout()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load()?;
    let _guard = logging::init_logging(&config.logging.dir);

    let aggregator = build_aggregator(&config)?;

    match cli.command {
        Commands::Refresh { force } => {
            let snapshot = aggregator.refresh(force).await;
            let last_update = aggregator.cache().last_update().await;
            print_json(&OutagesResponse::new(&snapshot, last_update))?;
        }
        Commands::Cached => match aggregator.get_cached().await {
            Some(snapshot) => {
                let last_update = aggregator.cache().last_update().await;
                print_json(&OutagesResponse::new(&snapshot, last_update))?;
            }
            None => {
                warn!("No cached snapshot yet; run `refresh` first");
                print_json(&serde_json::Value::Null)?;
            }
        },
        Commands::Health => {
            print_json(&aggregator.check_health().await)?;
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let metrics = match observability::init() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Metrics disabled: {}", e);
                    None
                }
            };
            let aggregator = Arc::new(aggregator);
            let every = Duration::from_secs(config.server.refresh_interval_seconds.max(1));
            info!("Refreshing every {:?}", every);
            server::spawn_refresh_loop(aggregator.clone(), every);
            server::start_server(aggregator, metrics, port)
                .await
                .map_err(|e| anyhow::anyhow!("server error: {e}"))?;
        }
    }
    Ok(())
}
