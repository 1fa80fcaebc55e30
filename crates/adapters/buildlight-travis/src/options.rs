use buildlight_core::RepoOption;

use crate::applet::TravisApplet;
use crate::error::TravisError;
use crate::models::ReposResponse;

/// Convert a repositories listing into selection options, keeping the
/// provider's order.
pub fn repo_options(response: ReposResponse) -> Vec<RepoOption> {
    tracing::info!("Processing Travis repos response");
    let options: Vec<RepoOption> = response
        .repositories
        .into_iter()
        .map(|repo| RepoOption::new(repo.id.to_string(), repo.name.to_string()))
        .collect();
    tracing::info!(count = options.len(), "Got repo options");
    for option in &options {
        tracing::debug!(key = %option.key, label = %option.label, "Repo option");
    }
    options
}

impl TravisApplet {
    /// Repositories the configured credential can see.
    ///
    /// `search` is accepted for the host's options hook but does not filter.
    pub async fn fetch_options(
        &self,
        _search: Option<&str>,
    ) -> Result<Vec<RepoOption>, TravisError> {
        let session = self.session().ok_or(TravisError::NotConfigured)?;
        tracing::info!("Loading repos");
        let response = session.client.repos(self.settings.repos_limit).await?;
        Ok(repo_options(response))
    }

    /// Options hook. Failures are logged and produce an empty list.
    pub async fn options(&self, search: Option<&str>) -> Vec<RepoOption> {
        match self.fetch_options(search).await {
            Ok(options) => options,
            Err(TravisError::NotConfigured) => {
                tracing::warn!("Options requested before any configuration was applied");
                Vec::new()
            },
            Err(e) => {
                tracing::error!(error = %e, "Caught error when loading options");
                Vec::new()
            },
        }
    }
}
