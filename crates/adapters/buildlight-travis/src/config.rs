use std::fmt;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "https://api.travis-ci.com";
pub const DEFAULT_WEB_BASE_URL: &str = "https://travis-ci.com";

/// Connection settings for the Travis adapter.
#[derive(Debug, Clone)]
pub struct TravisConfig {
    /// Base URL of the Travis v3 API.
    pub api_base_url: String,
    /// Base URL for the "Show in Travis" link.
    pub web_base_url: String,
    /// Polling interval in seconds.
    pub poll_interval_secs: u64,
    /// Upper bound for a single API request.
    pub request_timeout_secs: u64,
    /// Number of builds requested per tick. Only the first is inspected.
    pub builds_limit: u32,
    /// Number of repositories requested for the options list.
    pub repos_limit: u32,
}

impl Default for TravisConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            poll_interval_secs: 60,
            request_timeout_secs: 10,
            builds_limit: 5,
            repos_limit: 1000,
        }
    }
}

impl TravisConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// User-supplied applet configuration. Replaced wholesale on every change.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppletConfig {
    /// Opaque Travis repository id selected by the user.
    pub repo_id: Option<String>,
    /// Display name override for the repository.
    pub repo_label: Option<String>,
    /// Travis API token.
    pub api_key: String,
}

impl AppletConfig {
    /// The configured repository id, treating an empty string as absent.
    pub fn repo_id(&self) -> Option<&str> {
        self.repo_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Label override if set, otherwise the raw repository id.
    pub fn display_name(&self) -> Option<&str> {
        self.repo_label
            .as_deref()
            .filter(|label| !label.is_empty())
            .or_else(|| self.repo_id())
    }
}

impl fmt::Debug for AppletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppletConfig")
            .field("repo_id", &self.repo_id)
            .field("repo_label", &self.repo_label)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
