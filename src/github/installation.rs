//! Resolve which GitHub App installation grants access to a repository.
//!
//! An App JWT lists the App's installations. Each installation is exchanged
//! for an installation token in response order until the accessible
//! repository list contains the target URL.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::instrument;

use super::jwt::SignedAppJwt;
use super::types::InstallationRecord;
use super::GitHubError;

/// Inbound header naming a GitHub Enterprise host.
pub const ENTERPRISE_HOST_HEADER: &str = "x-github-enterprise-host";

/// Read the enterprise host hint from inbound webhook headers.
pub fn enterprise_host_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ENTERPRISE_HOST_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The repository a pipeline run belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    /// Web URL of the repository, e.g. `https://github.com/octo-org/hello-world`
    pub url: String,
}

impl RepositorySpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Outcome of [`InstallationResolver::resolve`].
///
/// `installation_id` is 0 when no installation matched; `token` then holds
/// the last token obtained, or is empty.
#[derive(Clone, Default)]
pub struct ResolvedInstallation {
    pub enterprise_host: Option<String>,
    pub token: String,
    pub installation_id: i64,
    pub account_login: Option<String>,
}

impl ResolvedInstallation {
    pub fn is_match(&self) -> bool {
        self.installation_id != 0
    }
}

impl std::fmt::Debug for ResolvedInstallation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedInstallation")
            .field("enterprise_host", &self.enterprise_host)
            .field("token", &if self.token.is_empty() { "" } else { "[redacted]" })
            .field("installation_id", &self.installation_id)
            .field("account_login", &self.account_login)
            .finish()
    }
}

/// Remote operations the resolver depends on.
#[async_trait]
pub trait InstallationApi: Send + Sync {
    /// `GET /app/installations` authenticated with the App JWT.
    async fn list_installations(
        &self,
        jwt: &SignedAppJwt,
        enterprise_host: Option<&str>,
    ) -> Result<Vec<InstallationRecord>, GitHubError>;

    /// Exchange an installation ID for an installation token.
    async fn issue_installation_token(
        &self,
        enterprise_host: Option<&str>,
        installation_id: i64,
        namespace: &str,
    ) -> Result<String, GitHubError>;

    /// Web URLs of every repository the current client identity can access.
    async fn list_repository_urls(&self) -> Result<Vec<String>, GitHubError>;
}

/// Accessible repository URLs, fetched on first use and reused afterwards.
struct AccessibleRepos {
    urls: Option<Vec<String>>,
}

impl AccessibleRepos {
    fn new() -> Self {
        Self { urls: None }
    }

    async fn contains(&mut self, api: &dyn InstallationApi, url: &str) -> Result<bool, GitHubError> {
        if self.urls.is_none() {
            let urls = api.list_repository_urls().await?;
            tracing::debug!(count = urls.len(), "Fetched accessible repositories");
            self.urls = Some(urls);
        }
        Ok(self
            .urls
            .as_ref()
            .is_some_and(|urls| urls.iter().any(|u| u == url)))
    }
}

pub struct InstallationResolver<'a> {
    api: &'a dyn InstallationApi,
    namespace: &'a str,
}

impl<'a> InstallationResolver<'a> {
    /// `namespace` scopes where issued credentials are stored.
    pub fn new(api: &'a dyn InstallationApi, namespace: &'a str) -> Self {
        Self { api, namespace }
    }

    /// Find the installation whose accessible repositories include `target`.
    ///
    /// Stops at the first match. A null installation ID anywhere before the
    /// match aborts with [`GitHubError::Protocol`]. No match is not an error:
    /// the returned ID is 0.
    #[instrument(skip(self, jwt), fields(repo = %target.url))]
    pub async fn resolve(
        &self,
        jwt: &SignedAppJwt,
        target: &RepositorySpec,
        enterprise_host: Option<&str>,
    ) -> Result<ResolvedInstallation, GitHubError> {
        let installations = self.api.list_installations(jwt, enterprise_host).await?;

        let mut resolved = ResolvedInstallation {
            enterprise_host: enterprise_host.map(str::to_string),
            ..Default::default()
        };
        let mut repos = AccessibleRepos::new();

        for installation in &installations {
            let id = installation
                .id
                .ok_or_else(|| GitHubError::Protocol("installation ID is nil".to_string()))?;

            if id != 0 {
                resolved.token = self
                    .api
                    .issue_installation_token(enterprise_host, id, self.namespace)
                    .await?;
            }

            if repos.contains(self.api, &target.url).await? {
                resolved.installation_id = id;
                resolved.account_login = installation.account.as_ref().map(|a| a.login.clone());
                tracing::info!(
                    installation_id = id,
                    account = resolved.account_login.as_deref().unwrap_or(""),
                    "Matched GitHub App installation"
                );
                return Ok(resolved);
            }
        }

        tracing::warn!(
            installations = installations.len(),
            "No GitHub App installation has access to repository"
        );
        Ok(resolved)
    }
}
