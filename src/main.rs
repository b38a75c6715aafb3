use std::sync::Arc;

use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

use delivery_dispatch::api;
use delivery_dispatch::config::Config;
use delivery_dispatch::engine::{run_dispatch_loop, DispatchSettings};
use delivery_dispatch::error::AppError;
use delivery_dispatch::eta::{EtaEstimator, RegressionEtaModel};
use delivery_dispatch::routing::provider_from_config;
use delivery_dispatch::state::AppState;
use delivery_dispatch::store::InMemoryStore;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let router = provider_from_config(&config)
        .map_err(|err| AppError::Internal(format!("routing provider setup failed: {err}")))?;

    let eta: Arc<dyn EtaEstimator> = match &config.eta_model_path {
        Some(path) => Arc::new(
            RegressionEtaModel::from_json_file(path)
                .map_err(|err| AppError::Internal(err.to_string()))?,
        ),
        None => Arc::new(RegressionEtaModel::default()),
    };

    let app_state = AppState::new(
        Arc::new(InMemoryStore::new()),
        router,
        eta,
        DispatchSettings::from(&config),
        config.event_buffer_size,
    );
    let shared_state = Arc::new(app_state);

    if config.dispatch_interval_secs > 0 {
        tokio::spawn(run_dispatch_loop(
            shared_state.engine.clone(),
            Duration::from_secs(config.dispatch_interval_secs),
        ));
    }

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        routing_provider = ?config.routing_provider,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
