use std::fmt;

use serde::Deserialize;

use buildlight_core::BuildState;

/// Partial Travis API response for `GET /repo/{id}`.
#[derive(Debug, Deserialize)]
pub struct RepoResponse {
    pub slug: String,
}

/// Partial Travis API response for `GET /repos`.
#[derive(Debug, Deserialize)]
pub struct ReposResponse {
    pub repositories: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub id: Scalar,
    pub name: Scalar,
}

/// A repository id or name as sent by the API. Travis sends numeric ids and
/// string names, but any scalar is accepted and shown as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Partial Travis API response for `GET /repo/{id}/builds`, newest first.
///
/// Builds stay untyped: only the newest one is read, so an odd older entry
/// cannot fail the whole response.
#[derive(Debug, Deserialize)]
pub struct BuildsResponse {
    pub builds: Vec<serde_json::Value>,
}

impl BuildsResponse {
    /// State of the newest build, `None` when there are no builds. A missing,
    /// null or non-string state is unrecognized.
    pub fn latest_state(&self) -> Option<BuildState> {
        let latest = self.builds.first()?;
        let state = match latest.get("state") {
            Some(serde_json::Value::String(raw)) => BuildState::parse(raw),
            Some(serde_json::Value::Null) | None => BuildState::Unrecognized(String::new()),
            Some(other) => BuildState::Unrecognized(other.to_string()),
        };
        Some(state)
    }
}
