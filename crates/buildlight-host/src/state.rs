use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use buildlight_travis::TravisApplet;

use crate::auth::AuthConfig;
use crate::config::HostConfig;
use crate::signal_store::SignalStore;

pub type SharedSignalStore = Arc<RwLock<SignalStore>>;

#[derive(Clone)]
pub struct AppState {
    pub applet: Arc<TravisApplet>,
    pub signals: SharedSignalStore,
    pub auth: AuthConfig,
    pub config: Arc<HostConfig>,
    pub sse_subscriber_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: HostConfig) -> Self {
        let auth = AuthConfig {
            bearer_token: config.auth.bearer_token.clone(),
        };
        let signals = SignalStore::with_capacity(
            config.limits.max_stored_signals,
            config.limits.broadcast_capacity,
        );
        Self {
            applet: Arc::new(TravisApplet::new(config.travis.to_travis_config())),
            signals: Arc::new(RwLock::new(signals)),
            auth,
            config: Arc::new(config),
            sse_subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// Holds one slot of a connection counter for as long as it lives.
pub struct ConnectionGuard {
    counter: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self { counter }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}
