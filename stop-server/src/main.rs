use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stop_server::cache::SnapshotCache;
use stop_server::config::AppConfig;
use stop_server::error::ErrorChain;
use stop_server::registry::StopRegistry;
use stop_server::upstream::{MockTransport, StopClient, StopSource};
use stop_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stop_server=info,tower_http=info".into()),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %ErrorChain(&e), "Invalid configuration");
            std::process::exit(1);
        }
    };

    match &config.mock_dir {
        Some(dir) => {
            let transport = MockTransport::from_dir(dir).expect("Failed to load mock stops");
            tracing::warn!(dir = %dir.display(), "Serving mock stop data");
            let client = StopClient::with_transport(config.client.clone(), transport)
                .expect("Failed to create stop client");
            run(client, config).await;
        }
        None => {
            let client =
                StopClient::new(config.client.clone()).expect("Failed to create stop client");
            tracing::info!(
                base_url = %config.client.base_url,
                headers = config.client.header_profile.name(),
                "Using live stop API"
            );
            run(client, config).await;
        }
    }
}

async fn run<S: StopSource>(source: S, config: AppConfig) {
    let cache = SnapshotCache::new(&config.cache);
    let registry = Arc::new(StopRegistry::new(Arc::new(source), cache));

    let startup = config.startup_stops();
    if !startup.is_empty() {
        let configured = registry.configure_all(&startup).await;
        tracing::info!(
            configured = configured.len(),
            requested = startup.len(),
            "Configured startup stops"
        );
    }

    let app = create_router(AppState::new(Arc::clone(&registry)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Stop monitor listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    registry.shutdown().await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
