mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use garde_pipeline::IngestionService;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(garde_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting garde-server");

    let store = garde_db::open_store(&config).await?;
    let service = Arc::new(IngestionService::from_app_config(&config, store)?);

    spawn_bootstrap_ingestion(Arc::clone(&service));
    let _scheduler = scheduler::build_scheduler(Arc::clone(&service), &config).await?;

    let app = build_app(AppState { service }, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Populate an empty store in the background so the API can serve at once.
fn spawn_bootstrap_ingestion(service: Arc<IngestionService>) {
    tokio::spawn(async move {
        match service.store().get_all().await {
            Ok(records) if records.is_empty() => {
                tracing::info!("store is empty; running initial ingestion");
                let summary = service.run_ingestion().await;
                tracing::info!(
                    success = summary.success,
                    count = summary.count,
                    "initial ingestion finished"
                );
            }
            Ok(records) => {
                tracing::info!(count = records.len(), "store already populated");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read store at startup");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
