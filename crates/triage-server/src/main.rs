//! CivicTriage: complaint extraction and risk ranking server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use triage_core::TriageConfig;
use triage_runtime::ModelContext;
use triage_store::SqliteStore;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("CIVICTRIAGE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

/// Load every model once and report what was found.
fn check_models(data_dir: PathBuf) -> anyhow::Result<()> {
    let config = TriageConfig::from_env(&data_dir)?;
    let models = ModelContext::load(&config).context("Model check failed")?;
    let summary = models.summary();
    println!("Data directory:   {}", data_dir.display());
    println!("Feature width:    {}", summary.feature_width);
    println!("Embedder loaded:  {}", summary.embedder_available);
    if !summary.embedder_available {
        println!("Complaints cannot be scored until the embedding model is installed.");
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--check" | "check" => {
                let data_dir = args
                    .get(2)
                    .map(PathBuf::from)
                    .unwrap_or_else(resolve_data_dir);
                return check_models(data_dir);
            }
            "--help" | "-h" | "help" => {
                println!("CivicTriage: complaint extraction and risk ranking server");
                println!();
                println!("Usage: civictriage [command]");
                println!();
                println!("Commands:");
                println!("  (none)              Start the server");
                println!("  check [data-dir]    Load models and report their status");
                println!("  help                Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'civictriage help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = TriageConfig::from_env(&data_dir)?;
    let port = config.port;

    let models = Arc::new(ModelContext::load(&config).context("Failed to load models")?);

    let store = Arc::new(
        SqliteStore::open(&config.data_paths.db)
            .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?,
    );

    let state = Arc::new(AppState::new(config, models, store));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("CivicTriage server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
