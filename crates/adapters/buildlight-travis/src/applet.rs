use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::task::AbortHandle;

use crate::client::TravisClient;
use crate::config::{AppletConfig, TravisConfig};
use crate::slug::SlugCache;

/// Travis build-state applet.
///
/// Holds the adapter settings, the currently applied configuration (swapped
/// whole on every change), and the resolved slug. The three host hooks live
/// in [`crate::resolver`], [`crate::options`], and [`crate::poller`].
pub struct TravisApplet {
    pub(crate) settings: TravisConfig,
    session: RwLock<Option<Arc<Session>>>,
    pub(crate) slug: Arc<SlugCache>,
    /// Serializes poll ticks.
    pub(crate) tick_lock: tokio::sync::Mutex<()>,
    /// Background slug resolution for the current configuration.
    pub(crate) resolve_task: Mutex<Option<AbortHandle>>,
}

/// An applied configuration together with the client built from it.
pub(crate) struct Session {
    pub config: AppletConfig,
    pub client: TravisClient,
}

impl TravisApplet {
    pub fn new(settings: TravisConfig) -> Self {
        Self {
            settings,
            session: RwLock::new(None),
            slug: Arc::new(SlugCache::new()),
            tick_lock: tokio::sync::Mutex::new(()),
            resolve_task: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &TravisConfig {
        &self.settings
    }

    /// Currently applied configuration, if any.
    pub fn config(&self) -> Option<AppletConfig> {
        self.session().map(|s| s.config.clone())
    }

    /// Whether a repository has been selected.
    pub fn is_configured(&self) -> bool {
        self.session()
            .is_some_and(|s| s.config.repo_id().is_some())
    }

    /// Last resolved slug; empty while unresolved or after a failed lookup.
    pub fn slug(&self) -> String {
        self.slug.get()
    }

    pub(crate) fn session(&self) -> Option<Arc<Session>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn install_session(&self, session: Arc<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub(crate) fn resolve_task(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.resolve_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Abort any in-flight slug resolution.
    pub fn shutdown(&self) {
        if let Some(task) = self.resolve_task().take() {
            task.abort();
        }
    }
}

impl Drop for TravisApplet {
    fn drop(&mut self) {
        self.shutdown();
    }
}
