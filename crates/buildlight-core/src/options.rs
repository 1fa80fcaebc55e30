use serde::{Deserialize, Serialize};

/// A selectable repository in the configuration UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOption {
    /// Provider repository id, stringified.
    pub key: String,
    /// Display name.
    pub label: String,
}

impl RepoOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}
