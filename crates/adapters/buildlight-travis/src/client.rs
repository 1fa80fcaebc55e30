use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::config::TravisConfig;
use crate::error::TravisError;
use crate::models::{BuildsResponse, RepoResponse, ReposResponse};

pub const API_VERSION_HEADER: &str = "travis-api-version";
pub const API_VERSION: &str = "3";

/// Thin Travis v3 API client. Every request carries the auth and version
/// headers and is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct TravisClient {
    http: reqwest::Client,
    api_base_url: String,
}

impl TravisClient {
    pub fn new(config: &TravisConfig, api_key: &str) -> Result<Self, TravisError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("buildlight-travis/", env!("CARGO_PKG_VERSION")))
            .default_headers(auth_headers(api_key)?)
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// `GET /repo/{repo_id}`
    pub async fn repo(&self, repo_id: &str) -> Result<RepoResponse, TravisError> {
        self.get_json(&repo_path(repo_id)).await
    }

    /// `GET /repos?limit={limit}`
    pub async fn repos(&self, limit: u32) -> Result<ReposResponse, TravisError> {
        self.get_json(&format!("/repos?limit={limit}")).await
    }

    /// `GET /repo/{repo_id}/builds?limit={limit}`
    pub async fn builds(&self, repo_id: &str, limit: u32) -> Result<BuildsResponse, TravisError> {
        self.get_json(&format!("{}/builds?limit={limit}", repo_path(repo_id)))
            .await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TravisError> {
        let url = format!("{}{path}", self.api_base_url);
        tracing::debug!(%url, "Travis API request");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TravisError::Status {
                path: path.to_string(),
                status,
            });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| TravisError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

/// `/repo/{repo_id}` with the id encoded as a single path segment.
fn repo_path(repo_id: &str) -> String {
    format!("/repo/{}", urlencoding::encode(repo_id))
}

/// Headers sent with every Travis request.
pub fn auth_headers(api_key: &str) -> Result<HeaderMap, TravisError> {
    let mut token = HeaderValue::from_str(&format!("token {api_key}"))
        .map_err(|_| TravisError::InvalidCredential)?;
    token.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    headers.insert(AUTHORIZATION, token);
    Ok(headers)
}
