use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use buildlight_core::{BuildState, Link, Signal, TickOutcome};

use crate::applet::{Session, TravisApplet};
use crate::error::TravisError;

pub const SIGNAL_NAME: &str = "Travis";
pub const LINK_LABEL: &str = "Show in Travis";
pub const NO_REPO_MESSAGE: &str =
    "No repository configured, please check your applet input configuration";

impl TravisApplet {
    /// One poll tick: fetch the latest builds of the configured repository
    /// and turn the newest build's state into a signal.
    ///
    /// Never fails. Missing configuration and API errors become
    /// [`TickOutcome::Error`], an empty build list becomes
    /// [`TickOutcome::Idle`]. Concurrent calls are serialized.
    pub async fn run(&self) -> TickOutcome {
        let _tick = self.tick_lock.lock().await;

        let (session, repo_id) = match self.polling_target() {
            Ok(target) => target,
            Err(e) => {
                tracing::info!(error = %e, "Skipping poll");
                return TickOutcome::error(NO_REPO_MESSAGE);
            },
        };
        tracing::debug!(repo_id, "Polling builds");

        let response = match session
            .client
            .builds(&repo_id, self.settings.builds_limit)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(repo_id, error = %e, "Error while getting builds");
                return TickOutcome::error(format!(
                    "Error while getting builds for repoId {repo_id}"
                ));
            },
        };

        let Some(state) = response.latest_state() else {
            tracing::debug!(repo_id, "No builds yet");
            return TickOutcome::Idle;
        };
        tracing::info!(repo_id, %state, "Latest build state");

        let display_name = session.config.display_name().unwrap_or(&repo_id);
        let link = show_link(&self.settings.web_base_url, &self.slug.get());
        TickOutcome::Signal(build_signal(display_name, &state, link))
    }

    /// Call [`run`](Self::run) on every poll interval and forward the outcome.
    /// Returns once the receiving side is dropped.
    pub async fn run_loop(self: Arc<Self>, tx: mpsc::UnboundedSender<TickOutcome>) {
        let mut interval = tokio::time::interval(self.settings.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let outcome = self.run().await;
            if tx.send(outcome).is_err() {
                tracing::info!("Outcome receiver closed, stopping poller");
                break;
            }
        }
    }

    fn polling_target(&self) -> Result<(Arc<Session>, String), TravisError> {
        let session = self.session().ok_or(TravisError::MissingRepository)?;
        let repo_id = session
            .config
            .repo_id()
            .ok_or(TravisError::MissingRepository)?
            .to_string();
        Ok((session, repo_id))
    }
}

/// Compose the signal for `state` on a repository shown as `display_name`.
pub fn build_signal(display_name: &str, state: &BuildState, link: Link) -> Signal {
    let display = state.display();
    Signal {
        name: SIGNAL_NAME.to_string(),
        point: display.into(),
        message: format!("{display_name}: {}", display.message),
        link: Some(link),
    }
}

/// Web link for a repository slug. An empty slug yields the bare base URL
/// with a trailing slash.
pub fn show_link(web_base_url: &str, slug: &str) -> Link {
    Link {
        url: format!("{}/{slug}", web_base_url.trim_end_matches('/')),
        label: LINK_LABEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use buildlight_core::Effect;

    use crate::config::{AppletConfig, TravisConfig};
    use crate::fake::{FakeTravis, Reply, builds_payload};

    #[test]
    fn signal_for_failed_build_blinks_red() {
        let link = show_link("https://travis-ci.com", "acme/api");
        let signal = build_signal("acme/api", &BuildState::Failed, link);
        assert_eq!(signal.name, "Travis");
        assert_eq!(signal.point.color, "#FF0000");
        assert_eq!(signal.point.effect, Effect::Blink);
        assert_eq!(signal.message, "acme/api: build failing");
        let link = signal.link.unwrap();
        assert_eq!(link.url, "https://travis-ci.com/acme/api");
        assert_eq!(link.label, "Show in Travis");
    }

    #[test]
    fn signal_for_unknown_state() {
        let signal = build_signal(
            "42",
            &BuildState::parse("errored"),
            show_link("https://travis-ci.com", ""),
        );
        assert_eq!(signal.point.color, "#FFFFFF");
        assert_eq!(signal.point.effect, Effect::SetColor);
        assert_eq!(signal.message, "42: Build state not recognized");
    }

    #[test]
    fn empty_slug_degrades_link() {
        assert_eq!(
            show_link("https://travis-ci.com/", "").url,
            "https://travis-ci.com/"
        );
    }

    #[tokio::test]
    async fn unconfigured_applet_reports_missing_repo() {
        let applet = TravisApplet::new(TravisConfig::default());
        let outcome = applet.run().await;
        assert_eq!(outcome.as_error().unwrap().messages, vec![NO_REPO_MESSAGE]);
    }

    #[tokio::test]
    async fn config_without_repo_reports_missing_repo() {
        let applet = TravisApplet::new(TravisConfig::default());
        let handle = applet
            .apply_config(AppletConfig {
                api_key: "k".to_string(),
                ..AppletConfig::default()
            })
            .unwrap();
        assert!(handle.is_none());
        assert!(!applet.is_configured());
        assert_eq!(applet.run().await, TickOutcome::error(NO_REPO_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn run_loop_emits_every_interval_until_receiver_drops() {
        let applet = Arc::new(TravisApplet::new(TravisConfig::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Arc::clone(&applet).run_loop(tx));

        for _ in 0..3 {
            let outcome = rx.recv().await.unwrap();
            assert!(outcome.as_error().is_some());
        }
        drop(rx);
        handle.await.unwrap();
    }

    fn applet_config(repo_id: &str, label: Option<&str>) -> AppletConfig {
        AppletConfig {
            repo_id: Some(repo_id.to_string()),
            repo_label: label.map(str::to_string),
            api_key: "secret-token".to_string(),
        }
    }

    async fn configured_applet(travis: &FakeTravis, label: Option<&str>) -> TravisApplet {
        let applet = TravisApplet::new(travis.travis_config());
        applet
            .apply_config(applet_config("2205", label))
            .unwrap()
            .unwrap()
            .await
            .unwrap();
        applet
    }

    #[tokio::test]
    async fn passed_build_gives_green_solid_signal() {
        let travis = FakeTravis::start().await;
        let applet = configured_applet(&travis, None).await;

        let outcome = applet.run().await;
        let signal = outcome.as_signal().expect("signal");
        assert_eq!(signal.point.color, "#00FF00");
        assert_eq!(signal.point.effect, Effect::SetColor);
        assert_eq!(signal.message, "2205: build passing");
        let link = signal.link.as_ref().unwrap();
        assert_eq!(link.url, "https://travis-ci.com/acme/api");
        assert_eq!(link.label, "Show in Travis");
    }

    #[tokio::test]
    async fn failed_build_gives_red_blinking_signal() {
        let travis = FakeTravis::start().await;
        travis.set_builds(Reply::Json(builds_payload(&["failed", "passed"])));
        let applet = configured_applet(&travis, Some("acme/api")).await;

        let outcome = applet.run().await;
        let signal = outcome.as_signal().expect("signal");
        assert_eq!(signal.point.color, "#FF0000");
        assert_eq!(signal.point.effect, Effect::Blink);
        assert_eq!(signal.message, "acme/api: build failing");
    }

    #[tokio::test]
    async fn only_latest_build_counts() {
        let travis = FakeTravis::start().await;
        travis.set_builds(Reply::Json(builds_payload(&["started", "failed", "failed"])));
        let applet = configured_applet(&travis, None).await;

        let signal = applet.run().await.as_signal().cloned().unwrap();
        assert_eq!(signal.point.color, "#FFA500");
        assert_eq!(signal.message, "2205: build running");
    }

    #[tokio::test]
    async fn unknown_state_gives_white_fallback() {
        let travis = FakeTravis::start().await;
        travis.set_builds(Reply::Json(builds_payload(&["errored"])));
        let applet = configured_applet(&travis, None).await;

        let signal = applet.run().await.as_signal().cloned().unwrap();
        assert_eq!(signal.point.color, "#FFFFFF");
        assert_eq!(signal.point.effect, Effect::SetColor);
        assert_eq!(signal.message, "2205: Build state not recognized");
    }

    #[tokio::test]
    async fn odd_older_builds_do_not_fail_the_tick() {
        let travis = FakeTravis::start().await;
        let applet = configured_applet(&travis, None).await;

        for body in [
            serde_json::json!({"builds": [{"state": "passed"}, {"id": 7}]}),
            serde_json::json!({"builds": [{"state": "passed"}, {"id": "x", "state": "failed"}]}),
        ] {
            travis.set_builds(Reply::Json(body));
            let signal = applet.run().await.as_signal().cloned().unwrap();
            assert_eq!(signal.point.color, "#00FF00");
            assert_eq!(signal.message, "2205: build passing");
        }
    }

    #[tokio::test]
    async fn null_latest_state_gives_white_fallback() {
        let travis = FakeTravis::start().await;
        travis.set_builds(Reply::Json(serde_json::json!({"builds": [{"state": null}]})));
        let applet = configured_applet(&travis, None).await;

        let signal = applet.run().await.as_signal().cloned().unwrap();
        assert_eq!(signal.point.color, "#FFFFFF");
        assert_eq!(signal.point.effect, Effect::SetColor);
        assert_eq!(signal.message, "2205: Build state not recognized");
    }

    #[tokio::test]
    async fn empty_build_list_is_idle() {
        let travis = FakeTravis::start().await;
        travis.set_builds(Reply::Json(builds_payload(&[])));
        let applet = configured_applet(&travis, None).await;

        assert_eq!(applet.run().await, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn builds_request_asks_for_five() {
        let travis = FakeTravis::start().await;
        let applet = configured_applet(&travis, None).await;
        applet.run().await;

        let request = travis
            .requests()
            .into_iter()
            .find(|r| r.path == "/repo/2205/builds")
            .unwrap();
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.authorization.as_deref(), Some("token secret-token"));
        assert_eq!(request.api_version.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn server_error_gives_error_signal() {
        let travis = FakeTravis::start().await;
        travis.set_builds(Reply::Status(500));
        let applet = configured_applet(&travis, None).await;

        assert_eq!(
            applet.run().await,
            TickOutcome::error("Error while getting builds for repoId 2205")
        );
    }

    #[tokio::test]
    async fn malformed_body_gives_error_signal() {
        let travis = FakeTravis::start().await;
        travis.set_builds(Reply::Json(serde_json::json!({"@type": "error"})));
        let applet = configured_applet(&travis, None).await;

        let outcome = applet.run().await;
        assert_eq!(
            outcome.as_error().unwrap().messages,
            vec!["Error while getting builds for repoId 2205"]
        );
    }

    #[tokio::test]
    async fn missing_repo_makes_no_request() {
        let travis = FakeTravis::start().await;
        let applet = TravisApplet::new(travis.travis_config());
        applet
            .apply_config(AppletConfig {
                api_key: "secret-token".to_string(),
                ..AppletConfig::default()
            })
            .unwrap();

        assert_eq!(applet.run().await, TickOutcome::error(NO_REPO_MESSAGE));
        assert_eq!(travis.hits(), 0);
    }

    #[tokio::test]
    async fn slug_failure_does_not_block_polling() {
        let travis = FakeTravis::start().await;
        travis.set_slug(Reply::Status(403));
        let applet = configured_applet(&travis, None).await;

        assert_eq!(applet.slug(), "");
        let signal = applet.run().await.as_signal().cloned().unwrap();
        assert_eq!(signal.point.color, "#00FF00");
        assert_eq!(signal.link.unwrap().url, "https://travis-ci.com/");
    }

    #[tokio::test]
    async fn concurrent_ticks_each_produce_one_outcome() {
        let travis = FakeTravis::start().await;
        let applet = Arc::new(configured_applet(&travis, None).await);

        let (a, b) = tokio::join!(applet.run(), applet.run());
        assert!(a.as_signal().is_some());
        assert!(b.as_signal().is_some());
        let builds_requests = travis
            .requests()
            .iter()
            .filter(|r| r.path.ends_with("/builds"))
            .count();
        assert_eq!(builds_requests, 2);
    }

    #[tokio::test]
    async fn hung_builds_request_is_cut_off_by_timeout() {
        let travis = FakeTravis::start().await;
        travis.set_builds_delay(Duration::from_secs(2));
        let applet = TravisApplet::new(TravisConfig {
            request_timeout_secs: 1,
            ..travis.travis_config()
        });
        applet
            .apply_config(applet_config("2205", None))
            .unwrap()
            .unwrap()
            .await
            .unwrap();

        let started = Instant::now();
        let outcome = applet.run().await;
        assert_eq!(
            outcome,
            TickOutcome::error("Error while getting builds for repoId 2205")
        );
        assert!(
            started.elapsed() < Duration::from_millis(1800),
            "tick took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn repo_id_is_sent_as_one_path_segment() {
        let travis = FakeTravis::start().await;
        let applet = TravisApplet::new(travis.travis_config());
        applet
            .apply_config(applet_config("acme/api", None))
            .unwrap()
            .unwrap()
            .await
            .unwrap();

        let signal = applet.run().await.as_signal().cloned().unwrap();
        assert_eq!(signal.message, "acme/api: build passing");
        let paths: Vec<String> = travis.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, ["/repo/acme/api", "/repo/acme/api/builds"]);
    }
}
