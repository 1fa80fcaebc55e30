pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod signal_store;
pub mod sse;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post, put};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;

use buildlight_core::TickOutcome;

use config::HostConfig;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: HostConfig) -> (Router<()>, AppState) {
    let http_timeout = Duration::from_secs(config.limits.http_timeout_secs);
    let state = AppState::new(config);

    // API routes (behind bearer auth middleware)
    let api_routes = Router::new()
        .route("/config", put(api::put_config))
        .route("/poll", post(api::post_poll))
        .route("/options", get(api::get_options))
        .route("/signal", get(api::get_latest))
        .route("/signals", get(api::get_recent))
        .route("/signals/stream", get(sse::signal_stream))
        .route("/status", get(api::get_status))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::bearer_auth_middleware,
        ));

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", api_routes)
        .layer(TimeoutLayer::new(http_timeout))
        .with_state(state.clone());

    (app, state)
}

/// Apply the `[applet]` section from the config file, if any.
pub fn apply_startup_config(state: &AppState) {
    let Some(applet_config) = state.config.applet.to_applet_config() else {
        return;
    };
    if let Err(e) = state.applet.apply_config(applet_config) {
        tracing::error!(error = %e, "Ignoring startup applet configuration");
    }
}

/// Run one tick and store its outcome.
pub async fn poll_once(state: &AppState) -> TickOutcome {
    let outcome = state.applet.run().await;
    store_outcome(state, outcome.clone()).await;
    outcome
}

/// Background task that drives the applet's poll loop and stores every
/// outcome. Aborting the returned handle stops the loop at its next tick.
pub fn spawn_poller(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let poller = tokio::spawn(Arc::clone(&state.applet).run_loop(tx));

        while let Some(outcome) = rx.recv().await {
            store_outcome(&state, outcome).await;
        }

        if let Err(e) = poller.await {
            tracing::error!("Poll loop ended abnormally: {e}");
        }
    })
}

async fn store_outcome(state: &AppState, outcome: TickOutcome) {
    match &outcome {
        TickOutcome::Signal(signal) => {
            tracing::info!(color = %signal.point.color, message = %signal.message, "Signal");
        },
        TickOutcome::Error(error) => {
            tracing::warn!(messages = ?error.messages, "Error signal");
        },
        TickOutcome::Idle => tracing::debug!("Nothing to show this tick"),
    }
    state.signals.write().await.record(outcome);
}
