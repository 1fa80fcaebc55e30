use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use buildlight_core::{RepoOption, TickOutcome};
use buildlight_travis::{AppletConfig, TravisError};

use crate::error::AppError;
use crate::signal_store::{SignalRecord, SignalStoreStats};
use crate::state::AppState;

/// Default page size for `GET /api/v1/signals`.
const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct OptionsQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Response for an accepted configuration.
#[derive(Debug, Serialize)]
pub struct ConfigAccepted {
    pub repo_id: Option<String>,
    /// Whether a slug lookup was started.
    pub resolving_slug: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub configured: bool,
    pub repo_id: Option<String>,
    pub slug: String,
    pub signals: SignalStoreStats,
}

/// PUT /api/v1/config: configuration-changed hook.
pub async fn put_config(
    State(state): State<AppState>,
    Json(config): Json<AppletConfig>,
) -> Result<(StatusCode, Json<ConfigAccepted>), AppError> {
    let repo_id = config.repo_id().map(str::to_string);
    let handle = state.applet.apply_config(config).map_err(|e| match e {
        TravisError::InvalidCredential => AppError::BadRequest(e.to_string()),
        other => {
            tracing::error!(error = %other, "Failed to apply configuration");
            AppError::Unavailable(other.to_string())
        },
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ConfigAccepted {
            repo_id,
            resolving_slug: handle.is_some(),
        }),
    ))
}

/// POST /api/v1/poll: run one tick now and return its outcome.
pub async fn post_poll(State(state): State<AppState>) -> Json<TickOutcome> {
    Json(crate::poll_once(&state).await)
}

/// GET /api/v1/options: options-query hook.
pub async fn get_options(
    State(state): State<AppState>,
    Query(query): Query<OptionsQuery>,
) -> Json<Vec<RepoOption>> {
    Json(state.applet.options(query.search.as_deref()).await)
}

/// GET /api/v1/signal: latest stored outcome, 204 before the first one.
pub async fn get_latest(State(state): State<AppState>) -> Response {
    let store = state.signals.read().await;
    match store.latest() {
        Some(record) => Json(record.clone()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /api/v1/signals: most recent outcomes, newest first.
pub async fn get_recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<SignalRecord>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .min(state.config.limits.max_stored_signals);
    let store = state.signals.read().await;
    Json(store.recent(limit).into_iter().cloned().collect())
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let signals = state.signals.read().await.stats();
    let repo_id = state
        .applet
        .config()
        .and_then(|c| c.repo_id().map(str::to_string));
    Json(StatusResponse {
        configured: state.applet.is_configured(),
        repo_id,
        slug: state.applet.slug(),
        signals,
    })
}
