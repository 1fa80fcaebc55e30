use tracing_subscriber::EnvFilter;

use buildlight_host::config::HostConfig;
use buildlight_host::{apply_startup_config, build_app, spawn_poller};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("BUILDLIGHT_LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = HostConfig::load();
    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    let listen_addr = config.listen_addr.clone();

    let (app, state) = build_app(config);
    apply_startup_config(&state);
    let poller = spawn_poller(state.clone());

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %listen_addr, "Failed to bind: {e}");
            std::process::exit(1);
        },
    };
    tracing::info!(addr = %listen_addr, "Buildlight host listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {e}");
    }

    poller.abort();
    state.applet.shutdown();
    tracing::info!("Buildlight host stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown requested");
}
