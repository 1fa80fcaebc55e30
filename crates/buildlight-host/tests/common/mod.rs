use std::net::SocketAddr;
use std::time::Duration;

use buildlight_host::config::{AppletSection, AuthFileConfig, HostConfig, TravisSection};
use buildlight_host::state::AppState;
use buildlight_host::{apply_startup_config, build_app};
use buildlight_travis::fake::FakeTravis;

pub struct TestServer {
    pub addr: SocketAddr,
    pub travis: FakeTravis,
    pub state: AppState,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start a host with no auth and no repository, backed by a fake Travis.
    pub async fn new() -> Self {
        let travis = FakeTravis::start().await;
        let config = Self::config_for(&travis);
        Self::from_parts(travis, config).await
    }

    /// Start a host with the `[applet]` section set to `repo_id`.
    pub async fn with_repo(repo_id: &str) -> Self {
        let travis = FakeTravis::start().await;
        let mut config = Self::config_for(&travis);
        config.applet = AppletSection {
            repo_id: Some(repo_id.to_string()),
            repo_label: Some("api".to_string()),
            api_key: Some("travis-key".to_string()),
        };
        Self::from_parts(travis, config).await
    }

    /// Start a host that requires a bearer token on `/api/v1`.
    pub async fn with_auth(token: &str) -> Self {
        let travis = FakeTravis::start().await;
        let mut config = Self::config_for(&travis);
        config.auth = AuthFileConfig {
            bearer_token: Some(token.to_string()),
        };
        Self::from_parts(travis, config).await
    }

    /// Host config pointing at `travis`.
    pub fn config_for(travis: &FakeTravis) -> HostConfig {
        HostConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            travis: TravisSection {
                api_base_url: travis.base_url(),
                request_timeout_secs: 2,
                ..TravisSection::default()
            },
            ..HostConfig::default()
        }
    }

    pub async fn from_parts(travis: FakeTravis, config: HostConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, state) = build_app(config);
        apply_startup_config(&state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            travis,
            state,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("http://{}/api/v1{path}", self.addr)
    }
}

/// `PUT /api/v1/config` body selecting `repo_id`.
pub fn config_body(repo_id: &str, label: &str) -> serde_json::Value {
    serde_json::json!({
        "repo_id": repo_id,
        "repo_label": label,
        "api_key": "travis-key",
    })
}

/// Poll until the adapter has resolved a non-empty slug.
pub async fn wait_for_slug(server: &TestServer) -> String {
    for _ in 0..100 {
        let slug = server.state.applet.slug();
        if !slug.is_empty() {
            return slug;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("slug was never resolved");
}
