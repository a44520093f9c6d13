//! FieldOps server binary: load settings, open the database, serve.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fieldops_server::{build_router, AppState};
use fieldops_settings::{load_settings_from_path, settings_path};
use fieldops_store::{migrations, open_pool};

#[derive(Parser)]
#[command(name = "fieldops", about = "Sales operations backend", version)]
struct Cli {
    /// Path to the settings file (default `~/.fieldops/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the database path.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(settings_path);
    let mut settings =
        load_settings_from_path(&config_path).context("failed to load settings")?;
    if let Some(db) = cli.db {
        settings.database.path = db.display().to_string();
    }
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    let pool = open_pool(
        std::path::Path::new(&settings.database.path),
        settings.database.pool_size,
    )
    .context("failed to open database")?;
    let conn = pool.get()?;
    let applied = migrations::run_migrations(&conn)?;
    if applied > 0 {
        info!(applied, "database migrated");
    }

    let bind = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::new(pool, settings);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %listener.local_addr()?, "fieldops server listening");

    axum_serve(listener, router).await?;
    info!("shutdown complete");
    Ok(())
}

async fn axum_serve(
    listener: tokio::net::TcpListener,
    router: axum::Router,
) -> anyhow::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
        .context("server error")
}
