use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::applet::{Session, TravisApplet};
use crate::client::TravisClient;
use crate::config::AppletConfig;
use crate::error::TravisError;

impl TravisApplet {
    /// Apply a new configuration.
    ///
    /// Builds the authenticated client, swaps in the configuration and clears
    /// the cached slug. When a repository is selected, slug resolution starts
    /// in the background and its handle is returned; polling does not wait on
    /// it. A credential that cannot be sent as a header is rejected and the
    /// previous configuration stays active.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn apply_config(
        &self,
        config: AppletConfig,
    ) -> Result<Option<JoinHandle<()>>, TravisError> {
        let client = TravisClient::new(&self.settings, &config.api_key)?;
        let repo_id = config.repo_id().map(str::to_string);

        let mut task = self.resolve_task();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        tracing::info!(
            repo_id = repo_id.as_deref().unwrap_or("<none>"),
            "Applying applet configuration"
        );
        let session = Arc::new(Session { config, client });
        self.install_session(Arc::clone(&session));
        let generation = self.slug.begin();

        let Some(repo_id) = repo_id else {
            return Ok(None);
        };

        let cache = Arc::clone(&self.slug);
        let handle = tokio::spawn(async move {
            let slug = resolve_slug(&session.client, &repo_id).await;
            if !cache.store(generation, slug) {
                tracing::debug!(repo_id, "Discarding slug from superseded configuration");
            }
        });
        *task = Some(handle.abort_handle());
        Ok(Some(handle))
    }
}

/// Look up the slug for `repo_id`. Failures are logged and yield `""`.
pub async fn resolve_slug(client: &TravisClient, repo_id: &str) -> String {
    tracing::info!(repo_id, "Getting selected repo's slug");
    match client.repo(repo_id).await {
        Ok(repo) => {
            tracing::debug!(repo_id, slug = %repo.slug, "Resolved repo slug");
            repo.slug
        },
        Err(e) => {
            tracing::warn!(repo_id, error = %e, "Error while fetching slug");
            String::new()
        },
    }
}
