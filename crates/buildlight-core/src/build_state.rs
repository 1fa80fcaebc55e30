use std::fmt;

use serde::{Deserialize, Serialize};

/// Orange, shared by every in-progress state.
pub const COLOR_IN_PROGRESS: &str = "#FFA500";
pub const COLOR_CANCELED: &str = "#0000FF";
pub const COLOR_PASSED: &str = "#00FF00";
pub const COLOR_FAILED: &str = "#FF0000";
/// Shown for any state string the table does not know.
pub const COLOR_UNRECOGNIZED: &str = "#FFFFFF";

pub const MESSAGE_UNRECOGNIZED: &str = "Build state not recognized";

/// How a signal color is rendered on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    /// Solid color, no animation.
    #[default]
    SetColor,
    Blink,
}

/// State of a single CI build as reported by the provider.
///
/// Parsing never fails: strings outside the known set are kept verbatim in
/// [`BuildState::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildState {
    Booting,
    Created,
    Started,
    Canceled,
    Passed,
    Failed,
    Unrecognized(String),
}

impl BuildState {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "booting" => Self::Booting,
            "created" => Self::Created,
            "started" => Self::Started,
            "canceled" => Self::Canceled,
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Booting => "booting",
            Self::Created => "created",
            Self::Started => "started",
            Self::Canceled => "canceled",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Map this state to its color, effect and message.
    pub fn display(&self) -> StateDisplay {
        let (color, effect, message) = match self {
            Self::Booting => (COLOR_IN_PROGRESS, Effect::SetColor, "build booting"),
            Self::Created => (COLOR_IN_PROGRESS, Effect::SetColor, "build created"),
            Self::Started => (COLOR_IN_PROGRESS, Effect::SetColor, "build running"),
            Self::Canceled => (COLOR_CANCELED, Effect::SetColor, "build canceled"),
            Self::Passed => (COLOR_PASSED, Effect::SetColor, "build passing"),
            Self::Failed => (COLOR_FAILED, Effect::Blink, "build failing"),
            Self::Unrecognized(_) => (COLOR_UNRECOGNIZED, Effect::SetColor, MESSAGE_UNRECOGNIZED),
        };
        StateDisplay {
            color,
            effect,
            message,
        }
    }
}

impl From<&str> for BuildState {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for BuildState {
    fn from(raw: String) -> Self {
        match Self::parse(&raw) {
            Self::Unrecognized(_) => Self::Unrecognized(raw),
            known => known,
        }
    }
}

impl From<BuildState> for String {
    fn from(state: BuildState) -> Self {
        match state {
            BuildState::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visible rendering of a [`BuildState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateDisplay {
    /// `#RRGGBB` hex color.
    pub color: &'static str,
    pub effect: Effect,
    pub message: &'static str,
}
