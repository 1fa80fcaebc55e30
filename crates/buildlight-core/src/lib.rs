pub mod build_state;
pub mod options;
pub mod signal;
pub mod time;

pub use build_state::{BuildState, Effect, StateDisplay};
pub use options::RepoOption;
pub use signal::{ErrorSignal, Link, Point, Signal, TickOutcome};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::build_state::BuildState;
    use crate::signal::{Link, Signal, TickOutcome};

    /// Create a signal for `state` on a repository named `repo`.
    pub fn make_signal(repo: &str, state: &str) -> Signal {
        let display = BuildState::parse(state).display();
        Signal {
            name: "Travis".to_string(),
            point: display.into(),
            message: format!("{repo}: {}", display.message),
            link: Some(Link {
                url: format!("https://travis-ci.com/acme/{repo}"),
                label: "Show in Travis".to_string(),
            }),
        }
    }

    /// Shorthand for a signal outcome.
    pub fn make_outcome(repo: &str, state: &str) -> TickOutcome {
        TickOutcome::Signal(make_signal(repo, state))
    }
}
