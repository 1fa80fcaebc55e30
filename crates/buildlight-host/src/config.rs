use std::fmt;
use std::path::Path;

use serde::Deserialize;

use buildlight_travis::config::{DEFAULT_API_BASE_URL, DEFAULT_WEB_BASE_URL};
use buildlight_travis::{AppletConfig, TravisConfig};

/// Default config file, overridable with `BUILDLIGHT_CONFIG`.
pub const DEFAULT_CONFIG_PATH: &str = "buildlight.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("listen_addr {0:?} is not a valid socket address")]
    InvalidListenAddr(String),
    #[error("{0} must be > 0")]
    Zero(&'static str),
}

/// Top-level host configuration, loaded from `buildlight.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub listen_addr: String,
    pub auth: AuthFileConfig,
    pub travis: TravisSection,
    pub applet: AppletSection,
    pub limits: LimitsConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8686".to_string(),
            auth: AuthFileConfig::default(),
            travis: TravisSection::default(),
            applet: AppletSection::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Auth section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthFileConfig {
    /// Bearer token for the `/api/v1` routes. None = auth disabled.
    pub bearer_token: Option<String>,
}

/// Travis connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TravisSection {
    pub api_base_url: String,
    pub web_base_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for TravisSection {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            poll_interval_secs: 60,
            request_timeout_secs: 10,
        }
    }
}

impl TravisSection {
    pub fn to_travis_config(&self) -> TravisConfig {
        TravisConfig {
            api_base_url: self.api_base_url.clone(),
            web_base_url: self.web_base_url.clone(),
            poll_interval_secs: self.poll_interval_secs,
            request_timeout_secs: self.request_timeout_secs,
            ..TravisConfig::default()
        }
    }
}

/// Initial applet configuration applied at startup.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppletSection {
    pub repo_id: Option<String>,
    pub repo_label: Option<String>,
    pub api_key: Option<String>,
}

impl AppletSection {
    /// The startup configuration, or None when neither a key nor a
    /// repository is set.
    pub fn to_applet_config(&self) -> Option<AppletConfig> {
        if self.api_key.is_none() && self.repo_id.is_none() {
            return None;
        }
        Some(AppletConfig {
            repo_id: self.repo_id.clone(),
            repo_label: self.repo_label.clone(),
            api_key: self.api_key.clone().unwrap_or_default(),
        })
    }
}

impl fmt::Debug for AppletSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppletSection")
            .field("repo_id", &self.repo_id)
            .field("repo_label", &self.repo_label)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Store, fan-out and HTTP limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_stored_signals: usize,
    pub broadcast_capacity: usize,
    pub max_sse_subscribers: usize,
    /// Upper bound for any HTTP handler, including a manual poll.
    pub http_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_stored_signals: 100,
            broadcast_capacity: 64,
            max_sse_subscribers: 16,
            http_timeout_secs: 30,
        }
    }
}

impl HostConfig {
    /// Validate configuration, logging warnings for questionable settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }

        if self.travis.poll_interval_secs == 0 {
            return Err(ConfigError::Zero("travis.poll_interval_secs"));
        }
        if self.travis.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("travis.request_timeout_secs"));
        }
        if self.limits.max_stored_signals == 0 {
            return Err(ConfigError::Zero("limits.max_stored_signals"));
        }
        if self.limits.broadcast_capacity == 0 {
            return Err(ConfigError::Zero("limits.broadcast_capacity"));
        }
        if self.limits.max_sse_subscribers == 0 {
            return Err(ConfigError::Zero("limits.max_sse_subscribers"));
        }
        if self.limits.http_timeout_secs == 0 {
            return Err(ConfigError::Zero("limits.http_timeout_secs"));
        }

        if self.limits.http_timeout_secs <= self.travis.request_timeout_secs {
            tracing::warn!(
                http = self.limits.http_timeout_secs,
                travis = self.travis.request_timeout_secs,
                "limits.http_timeout_secs is not above the Travis request timeout; manual polls may be cut off"
            );
        }
        if self.auth.bearer_token.is_some() {
            tracing::warn!(
                "bearer_token is set in config file, use BUILDLIGHT_API_TOKEN env var in production"
            );
        }
        if self.applet.api_key.is_some() {
            tracing::warn!(
                "applet.api_key is set in config file, use BUILDLIGHT_TRAVIS_API_KEY env var in production"
            );
        }
        if self.applet.repo_id.is_none() {
            tracing::info!("No repository configured yet; set one with PUT /api/v1/config");
        }

        Ok(())
    }

    /// Load config from `BUILDLIGHT_CONFIG` or `buildlight.toml`, then apply
    /// env var overrides.
    pub fn load() -> Self {
        let path = std::env::var("BUILDLIGHT_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_file(Path::new(&path));
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Parse `path`, falling back to defaults when it is missing or invalid.
    pub fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<HostConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        "Failed to parse config: {e}, using defaults"
                    );
                    HostConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                HostConfig::default()
            },
        }
    }

    /// Apply `BUILDLIGHT_*` overrides read through `lookup`. Empty values are
    /// ignored, as are numbers that fail to parse.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = var("BUILDLIGHT_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(token) = var("BUILDLIGHT_API_TOKEN") {
            self.auth.bearer_token = Some(token);
        }
        if let Some(key) = var("BUILDLIGHT_TRAVIS_API_KEY") {
            self.applet.api_key = Some(key);
        }
        if let Some(repo_id) = var("BUILDLIGHT_REPO_ID") {
            self.applet.repo_id = Some(repo_id);
        }
        if let Some(label) = var("BUILDLIGHT_REPO_LABEL") {
            self.applet.repo_label = Some(label);
        }
        if let Some(url) = var("BUILDLIGHT_TRAVIS_API_URL") {
            self.travis.api_base_url = url;
        }
        if let Some(val) = var("BUILDLIGHT_POLL_INTERVAL_SECS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.travis.poll_interval_secs = n;
        }
    }
}
