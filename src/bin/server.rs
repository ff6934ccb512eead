use std::sync::Arc;

use axum::routing::get;
use mediashare_server::{
    api::{self, AppState},
    config::Config,
    media::CloudinaryClient,
    migrator,
    store::SeaOrmVideoStore,
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!("server failed: {}", e);
        eprintln!("server failed: {e}");
        mediashare_server::telemetry::shutdown_telemetry();
        std::process::exit(1);
    }
    mediashare_server::telemetry::shutdown_telemetry();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    mediashare_server::telemetry::init_telemetry("mediashare-server")?;

    let config = Config::from_env()?;
    tracing::info!(bind_addr = %config.bind_addr, "configuration loaded");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection
    let db = Database::connect(&config.database_url).await?;

    migrator::Migrator::up(&db, None).await?;

    mediashare_server::metrics::init_metrics(&db).await;

    let store = Arc::new(SeaOrmVideoStore::new(db.clone()));
    let gateway = Arc::new(CloudinaryClient::new(&config.cloudinary)?);
    let state = AppState::new(store, gateway, config.upload.clone(), config.auth.clone())?;
    let uploads = state.uploads.clone();

    let app = api::router(state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(api::cors_layer(&config.cors_origin)?);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_shutdown(shutdown.clone(), uploads, config.shutdown_grace));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("server stopped, closing database connection");
    db.close().await?;
    Ok(())
}

/// Stops accepting connections on Ctrl-C/SIGTERM, then aborts in-flight
/// gateway uploads once `grace` has passed.
async fn watch_shutdown(
    shutdown: CancellationToken,
    uploads: CancellationToken,
    grace: std::time::Duration,
) {
    shutdown_signal().await;
    tracing::info!(grace_secs = grace.as_secs(), "shutdown requested, draining requests");
    shutdown.cancel();

    tokio::time::sleep(grace).await;
    tracing::warn!("grace period elapsed, cancelling in-flight uploads");
    uploads.cancel();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
