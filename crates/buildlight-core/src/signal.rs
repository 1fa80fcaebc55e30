use serde::{Deserialize, Serialize};

use crate::build_state::{Effect, StateDisplay};

/// One lit key: a color and how it is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub color: String,
    pub effect: Effect,
}

impl From<StateDisplay> for Point {
    fn from(display: StateDisplay) -> Self {
        Self {
            color: display.color.to_string(),
            effect: display.effect,
        }
    }
}

/// Deep link attached to a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub label: String,
}

/// Visible output of a successful tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub point: Point,
    pub message: String,
    #[serde(default)]
    pub link: Option<Link>,
}

/// Failure surfaced to the user instead of a signal. Carries no link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSignal {
    pub messages: Vec<String>,
}

impl ErrorSignal {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }
}

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TickOutcome {
    Signal(Signal),
    Error(ErrorSignal),
    /// Nothing to show this tick.
    Idle,
}

impl TickOutcome {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorSignal::new(message))
    }

    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            Self::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorSignal> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
