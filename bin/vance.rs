use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use vance::api::{create_router, AppState};
use vance::{IndexSettings, SearchService, ServerConfig};

#[derive(Parser)]
#[command(name = "vance")]
#[command(about = "Full-text search for wiki repositories", long_about = None)]
struct Args {
    /// Path to the index directory
    #[arg(short = 'd', long, env = "VANCE_DB")]
    db: PathBuf,

    /// Path to the wiki repository
    #[arg(short = 'r', long, env = "VANCE_REPO")]
    repo: PathBuf,

    /// Serve the HTTP API
    #[arg(long)]
    web: bool,

    /// Index every page of the repository and exit
    #[arg(long)]
    index: bool,

    /// HTTP bind address
    #[arg(long, env = "VANCE_BIND", default_value = "127.0.0.1:5000")]
    bind: String,

    /// Git branch listed when indexing
    #[arg(long, env = "VANCE_BRANCH", default_value = "master")]
    branch: String,

    /// JSON file with index settings
    #[arg(long, env = "VANCE_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'D', long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    if args.web == args.index {
        bail!("exactly one of --web or --index is required");
    }

    let settings = match &args.config {
        Some(path) => IndexSettings::from_json_file(path)?,
        None => IndexSettings::default(),
    };

    let server_config = ServerConfig::new(args.db.clone(), args.repo.clone())
        .with_bind_addr(args.bind.clone())
        .with_branch(args.branch.clone());

    info!("Starting vance v{}", vance::VERSION);
    info!("  Index directory: {:?}", server_config.index_dir);
    info!("  Repository: {:?} ({})", server_config.repo_dir, server_config.branch);

    let service = Arc::new(SearchService::open(&server_config, settings)?);

    if args.index {
        let indexer = Arc::clone(&service);
        let report = tokio::task::spawn_blocking(move || indexer.index_repository()).await??;
        for (path, reason) in &report.failed {
            warn!("Skipped {}: {}", path, reason);
        }
        println!("Indexed {} documents", report.indexed);
        service.close();
        return Ok(());
    }

    let initial_indexing = if service.index().doc_count() == 0 {
        info!("Index is empty, indexing repository in the background");
        Some(service.spawn_index_repository())
    } else {
        None
    };

    let app = create_router(AppState {
        service: Arc::clone(&service),
    });
    let listener = tokio::net::TcpListener::bind(&server_config.bind_addr).await?;
    info!("HTTP API server listening on {}", server_config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Received shutdown signal, gracefully shutting down");
        })
        .await?;

    if let Some(handle) = initial_indexing {
        if !handle.is_finished() {
            info!("Waiting for background indexing to finish");
        }
        match tokio::task::spawn_blocking(move || handle.join()).await? {
            Ok(Ok(report)) => info!("Background indexing indexed {} documents", report.indexed),
            Ok(Err(e)) => warn!("Background indexing failed: {}", e),
            Err(_) => warn!("Background indexing thread panicked"),
        }
    }

    service.close();
    Ok(())
}
