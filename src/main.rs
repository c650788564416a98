use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use webreal::config::ServerConfig;
use webreal::engine::ExecutionEngine;
use webreal::graph::IntoGraph;
use webreal::http::{RawGraph, WebrealServer};
use webreal::store::SqliteStore;

#[derive(Parser)]
#[command(name = "webreal", version, about = "Workflow graph engine and builder backend")]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "WEBREAL_CONFIG", default_value = "webreal.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Address to listen on, overrides the config file
        #[arg(long)]
        bind: Option<String>,
        /// SQLite database path, overrides the config file
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Execute a graph file and print the result as JSON
    Run {
        /// JSON file with `nodes` and `connections`
        file: PathBuf,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("webreal=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::resolve(&cli.config)?;

    match cli.command.unwrap_or(Commands::Serve {
        bind: None,
        database: None,
    }) {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Run { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let raw: RawGraph = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", file.display()))?;
            let graph = raw.into_graph()?;

            let result = ExecutionEngine::default().execute(graph);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }
        Commands::Serve { bind, database } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(database) = database {
                config.database_path = database;
            }

            let store = Arc::new(SqliteStore::open(&config.database_path)?);
            info!(path = %config.database_path.display(), "Database ready");

            let server = WebrealServer::new(
                config,
                Arc::new(ExecutionEngine::default()),
                store.clone(),
                store,
            );
            server.run(shutdown_signal()).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down...");
}
