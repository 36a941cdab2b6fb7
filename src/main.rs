use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docflow::navigation::LogSink;
use docflow::server::HttpGraphServer;
use docflow::config::local_settings;
use docflow::{Config, HttpRelationFetcher, RelationFetcher, Session, SourceRef, StaticRelationFetcher};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "docflow", version, about = "Expandable document flow graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the graph view HTTP API
    Serve {
        /// Answer relation lookups from built-in demo data instead of the API
        #[arg(long)]
        offline: bool,
        #[arg(long)]
        source_id: Option<String>,
        #[arg(long)]
        source_type: Option<String>,
    },
    /// Load a graph, apply expansions, and print the JSON snapshot
    Snapshot {
        #[arg(long)]
        offline: bool,
        #[arg(long)]
        source_id: Option<String>,
        #[arg(long)]
        source_type: Option<String>,
        /// Node ids to expand, in order
        #[arg(long = "expand")]
        expand: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is optional offline; its log level is the default filter when present.
    let config = Config::load();
    let default_level = config
        .as_ref()
        .map(|c| c.docflow.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", default_level))
        .init();

    match cli.command {
        Command::Serve {
            offline,
            source_id,
            source_type,
        } => {
            let (fetcher, expansion, http_server) = if offline {
                let (expansion, http_server) = local_settings(config.as_ref().ok());
                (offline_fetcher(), expansion, http_server)
            } else {
                let config = config?;
                (
                    build_fetcher(&config)?,
                    config.expansion.clone(),
                    config.http_server.clone(),
                )
            };
            let server = HttpGraphServer::with_settings(
                fetcher,
                expansion.subgraph_cache_capacity,
                expansion.default_source_type.clone(),
                http_server.allowed_origins,
            );
            server
                .load(source_ref(source_id, source_type, &expansion.default_source_type))
                .await;
            server.run(http_server.port).await?;
        }
        Command::Snapshot {
            offline,
            source_id,
            source_type,
            expand,
        } => {
            let (fetcher, expansion) = if offline {
                (offline_fetcher(), local_settings(config.as_ref().ok()).0)
            } else {
                let config = config?;
                (build_fetcher(&config)?, config.expansion.clone())
            };
            run_snapshot(
                fetcher,
                expansion.subgraph_cache_capacity,
                source_ref(source_id, source_type, &expansion.default_source_type),
                &expand,
            )
            .await?;
        }
    }

    Ok(())
}

fn offline_fetcher() -> Arc<dyn RelationFetcher> {
    log::info!("Offline mode: using built-in demo relations");
    Arc::new(StaticRelationFetcher::demo())
}

fn build_fetcher(config: &Config) -> Result<Arc<dyn RelationFetcher>> {
    let fetcher = HttpRelationFetcher::from_config(config)
        .context("Failed to set up relationship API client")?;
    Ok(Arc::new(fetcher))
}

fn source_ref(
    source_id: Option<String>,
    source_type: Option<String>,
    default_type: &str,
) -> Option<SourceRef> {
    source_id.map(|source_id| SourceRef {
        source_id,
        source_type: source_type.unwrap_or_else(|| default_type.to_string()),
    })
}

async fn run_snapshot(
    fetcher: Arc<dyn RelationFetcher>,
    capacity: usize,
    source: Option<SourceRef>,
    expand: &[String],
) -> Result<()> {
    let mut session = Session::new(fetcher, Arc::new(LogSink), capacity);
    session.load(source).await;
    if let Some(message) = session.error_message() {
        eprintln!("{}", message);
    }
    session.settle().await;

    for node_id in expand {
        session
            .expand(node_id)
            .with_context(|| format!("Failed to expand {}", node_id))?;
        session.settle().await;
    }

    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}
