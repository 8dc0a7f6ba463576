//! Obra session API server binary.

use std::sync::Arc;

use clap::Parser;
use obra_api::AppState;
use obra_api::config::ApiConfig;
use obra_core::store::PgStore;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "obra_server", about = "Obra session API server")]
struct Args {
    /// Address to bind; overrides `BIND_ADDR`.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/obra"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Skip running embedded migrations at startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,obra_api=debug,obra_core=debug,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    // Refuses to start without a strong signing secret.
    let mut config = ApiConfig::from_env()?;
    config.bind_addr = args.bind_addr;
    config.pg_connection_url = args.database_url;

    info!(
        bind_addr = %config.bind_addr,
        production = config.production,
        max_connections = args.max_connections,
        "starting obra_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    if !args.skip_migrations {
        info!("running database migrations");
        obra_core::migrate::migrate(&pool).await?;
    }

    let state = AppState::new(Arc::new(PgStore::new(pool)), config.clone());

    let ct = CancellationToken::new();
    let cleanup = state.spawn_cleanup_tasks(&ct);

    let app = obra_api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let shutdown = ct.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    ct.cancel();
    for handle in cleanup {
        let _ = handle.await;
    }

    Ok(())
}
