//! Event Ingest (fakt-ingest) - Main entry point
//!
//! Runs the periodic crawl-enrich-reconcile loop against the configured
//! listing feeds until interrupted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fakt_common::config::{load_config, resolve_root_folder};
use fakt_common::db::init_database;
use fakt_ingest::config::{settings_from_config, sources_from_config, visitors_from_config};
use fakt_ingest::Ingest;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for fakt-ingest
#[derive(Parser, Debug)]
#[command(name = "fakt-ingest")]
#[command(about = "Event listing ingest worker for fakt")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "FAKT_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database and mirrored images
    #[arg(short, long, env = "FAKT_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("fakt_ingest={0},fakt_common={0}", config.logging.level).into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;
    info!("Root folder: {}", root_folder.display());

    let settings = settings_from_config(&config.ingest).context("Invalid ingest configuration")?;
    info!("Time zone: {}", settings.timezone);

    if !config.ingest.enabled {
        info!("Ingest disabled in configuration, exiting");
        return Ok(());
    }

    let db_path = config.database_path(&root_folder);
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database: {}", db_path.display());

    let sources = sources_from_config(&config.ingest, &settings)
        .context("Invalid source configuration")?;
    if sources.is_empty() {
        warn!("No sources configured; cycles will only run cleanup");
    }

    let visitors = visitors_from_config(&config, &root_folder, pool.clone())
        .context("Invalid enrichment configuration")?;
    if config.ingest.artist_search.is_some() {
        info!(
            "Mirroring artwork to {}",
            config.static_files_path(&root_folder).display()
        );
    }

    let ingest = Ingest::new(pool.clone(), settings, sources, visitors);

    if args.once {
        let report = ingest.run_cycle().await;
        info!(
            ingested = report.ingested(),
            failed_events = report.failed_events(),
            failed_sources = report.failed_sources(),
            cleaned = ?report.cleaned,
            "Single cycle complete"
        );
    } else {
        let cancel = CancellationToken::new();
        tokio::spawn(shutdown_signal(cancel.clone()));
        ingest.run(cancel).await;
    }

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, finishing current cycle"),
        _ = terminate => info!("Received terminate signal, finishing current cycle"),
    }

    token.cancel();
}
