//! In-process stand-in for the Travis v3 API, served by axum on a random
//! local port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

use crate::config::TravisConfig;

/// Canned reply for one endpoint.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(serde_json::Value),
    Status(u16),
    /// Body that is not valid JSON.
    Garbage,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Self::Json(body) => Json(body).into_response(),
            Self::Status(code) => StatusCode::from_u16(code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response(),
            Self::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
        }
    }
}

/// A request seen by the fake server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub limit: Option<u32>,
    pub authorization: Option<String>,
    pub api_version: Option<String>,
}

struct FakeState {
    slug: Mutex<Reply>,
    repos: Mutex<Reply>,
    builds: Mutex<Reply>,
    slug_delay: Mutex<Duration>,
    builds_delay: Mutex<Duration>,
    requests: Mutex<Vec<Recorded>>,
    hits: AtomicUsize,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

/// Running fake Travis API.
pub struct FakeTravis {
    pub addr: SocketAddr,
    state: Arc<FakeState>,
    _server: tokio::task::JoinHandle<()>,
}

impl FakeTravis {
    /// Start with a resolvable slug, two repositories and a passing build.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            slug: Mutex::new(Reply::Json(slug_payload("acme/api"))),
            repos: Mutex::new(Reply::Json(repos_payload(&[(2205, "api"), (1771, "web")]))),
            builds: Mutex::new(Reply::Json(builds_payload(&["passed"]))),
            slug_delay: Mutex::new(Duration::ZERO),
            builds_delay: Mutex::new(Duration::ZERO),
            requests: Mutex::new(Vec::new()),
            hits: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/repo/{repo_id}", get(repo))
            .route("/repo/{repo_id}/builds", get(builds))
            .route("/repos", get(repos))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            _server: server,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Adapter settings pointing at this server with a short timeout.
    pub fn travis_config(&self) -> TravisConfig {
        TravisConfig {
            api_base_url: self.base_url(),
            request_timeout_secs: 2,
            ..TravisConfig::default()
        }
    }

    pub fn set_slug(&self, reply: Reply) {
        *self.state.slug.lock().unwrap() = reply;
    }

    pub fn set_repos(&self, reply: Reply) {
        *self.state.repos.lock().unwrap() = reply;
    }

    pub fn set_builds(&self, reply: Reply) {
        *self.state.builds.lock().unwrap() = reply;
    }

    /// Delay every slug lookup by `delay`.
    pub fn set_slug_delay(&self, delay: Duration) {
        *self.state.slug_delay.lock().unwrap() = delay;
    }

    /// Delay every builds listing by `delay`.
    pub fn set_builds_delay(&self, delay: Duration) {
        *self.state.builds_delay.lock().unwrap() = delay;
    }

    /// Total number of requests served.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }
}

/// `{"slug": ...}`
pub fn slug_payload(slug: &str) -> serde_json::Value {
    serde_json::json!({ "@type": "repository", "slug": slug })
}

/// `{"repositories": [{"id", "name"}, ...]}`
pub fn repos_payload(repos: &[(u64, &str)]) -> serde_json::Value {
    let repositories: Vec<_> = repos
        .iter()
        .map(|(id, name)| serde_json::json!({ "id": id, "name": name }))
        .collect();
    serde_json::json!({ "@type": "repositories", "repositories": repositories })
}

/// `{"builds": [{"state"}, ...]}`, newest first.
pub fn builds_payload(states: &[&str]) -> serde_json::Value {
    let builds: Vec<_> = states
        .iter()
        .enumerate()
        .map(|(i, state)| {
            serde_json::json!({
                "id": 1000 - i as u64,
                "number": (100 - i).to_string(),
                "state": state,
            })
        })
        .collect();
    serde_json::json!({ "@type": "builds", "builds": builds })
}

fn record(state: &FakeState, path: String, limit: Option<u32>, headers: &HeaderMap) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(Recorded {
        path,
        limit,
        authorization: header("authorization"),
        api_version: header("travis-api-version"),
    });
}

async fn repo(
    State(state): State<Arc<FakeState>>,
    Path(repo_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    record(&state, format!("/repo/{repo_id}"), None, &headers);
    let reply = state.slug.lock().unwrap().clone();
    let delay = *state.slug_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    reply
}

async fn builds(
    State(state): State<Arc<FakeState>>,
    Path(repo_id): Path<String>,
    Query(query): Query<LimitQuery>,
    headers: HeaderMap,
) -> Reply {
    record(&state, format!("/repo/{repo_id}/builds"), query.limit, &headers);
    let reply = state.builds.lock().unwrap().clone();
    let delay = *state.builds_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    reply
}

async fn repos(
    State(state): State<Arc<FakeState>>,
    Query(query): Query<LimitQuery>,
    headers: HeaderMap,
) -> Reply {
    record(&state, "/repos".to_string(), query.limit, &headers);
    state.repos.lock().unwrap().clone()
}
