//! GitHub REST client acting on behalf of a GitHub App.
//!
//! The client starts out authenticated with whatever token it was given (or
//! none) and switches identity when it exchanges an installation token, so
//! later repository and status calls run as that installation.

use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::installation::InstallationApi;
use super::jwt::{sign_app_jwt, AppIdentity, SignedAppJwt};
use super::status::{RunEvent, StatusApi};
use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use super::types::{
    CreateCheckRun, CreateComment, CreateCommitStatus, CreatedResource, InstallationRecord,
    InstallationTokenResponse, ListCheckRunsResponse, ListReposResponse, UpdateCheckRun,
};
use super::GitHubError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const REPOS_PER_PAGE: u32 = 100;
const CHECK_RUNS_PER_PAGE: u32 = 100;

/// API base for a GitHub Enterprise Server host.
pub fn enterprise_api_url(host: &str) -> String {
    format!("https://{}/api/v3", host)
}

/// GitHub API client for App and installation operations.
pub struct GitHubClient {
    api_url: ArcSwap<String>,
    token: ArcSwapOption<String>,
    identity: Option<AppIdentity>,
    transport: Arc<dyn HttpTransport>,
    cancel: CancellationToken,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: ArcSwap::from_pointee(api_url.trim_end_matches('/').to_string()),
            token: ArcSwapOption::empty(),
            identity: None,
            transport,
            cancel: CancellationToken::new(),
        }
    }

    /// Authenticate with an existing token (installation or personal).
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.token.store(Some(Arc::new(token.into())));
        self
    }

    /// App credentials used to mint JWTs for token exchange.
    pub fn with_app_identity(mut self, identity: AppIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Abort in-flight calls when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn api_url(&self) -> String {
        String::clone(&self.api_url.load())
    }

    pub fn token(&self) -> Option<String> {
        self.token.load_full().map(|t| (*t).clone())
    }

    /// The App ID check runs are filtered by, when App credentials are set.
    pub fn application_id(&self) -> Option<i64> {
        self.identity.as_ref().map(|i| i.application_id)
    }

    /// Send a request, racing it against cancellation.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GitHubError> {
        let url = request.url.clone();
        tracing::debug!(method = %request.method, url = %url, "GitHub API request");

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(GitHubError::Cancelled),
            response = self.transport.execute(request) => response?,
        };

        if !response.is_success() {
            tracing::debug!(url = %url, status = response.status, "GitHub API error response");
            return Err(GitHubError::transport(url, response.status));
        }
        Ok(response)
    }

    fn authenticated(&self, request: ApiRequest) -> ApiRequest {
        match self.token.load_full() {
            Some(token) => request.bearer((*token).clone()),
            None => request,
        }
    }

    /// Make an authenticated GET request to the GitHub API.
    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, GitHubError> {
        let response = self.send(self.authenticated(ApiRequest::get(url))).await?;
        response.json()
    }

    /// Make an authenticated POST request to the GitHub API.
    async fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<ApiResponse, GitHubError> {
        let request = ApiRequest::post(url).json(serde_json::to_value(body)?);
        self.send(self.authenticated(request)).await
    }

    /// Make an authenticated PATCH request to the GitHub API.
    async fn patch<B: Serialize>(&self, url: &str, body: &B) -> Result<ApiResponse, GitHubError> {
        let request = ApiRequest::patch(url).json(serde_json::to_value(body)?);
        self.send(self.authenticated(request)).await
    }

    fn app_base_url(&self, enterprise_host: Option<&str>) -> String {
        match enterprise_host {
            Some(host) => enterprise_api_url(host),
            None => self.api_url(),
        }
    }

    fn repo_url(&self, event: &RunEvent, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url(),
            event.organization,
            event.repository,
            path
        )
    }

    /// List repositories accessible to the current installation token, one page.
    pub async fn list_repos(&self, per_page: u32, page: u32) -> Result<ListReposResponse, GitHubError> {
        let url = format!(
            "{}/installation/repositories?per_page={}&page={}",
            self.api_url(),
            per_page,
            page
        );
        self.get(&url).await
    }
}

#[async_trait]
impl InstallationApi for GitHubClient {
    async fn list_installations(
        &self,
        jwt: &SignedAppJwt,
        enterprise_host: Option<&str>,
    ) -> Result<Vec<InstallationRecord>, GitHubError> {
        let url = format!("{}/app/installations", self.app_base_url(enterprise_host));
        let response = self.send(ApiRequest::get(url).bearer(jwt.token.clone())).await?;
        response.json()
    }

    async fn issue_installation_token(
        &self,
        enterprise_host: Option<&str>,
        installation_id: i64,
        namespace: &str,
    ) -> Result<String, GitHubError> {
        let identity = self.identity.as_ref().ok_or(GitHubError::NotAuthenticated)?;
        let jwt = sign_app_jwt(identity, Utc::now())?;

        let base_url = self.app_base_url(enterprise_host);
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            base_url, installation_id
        );
        let response = self.send(ApiRequest::post(url).bearer(jwt.token)).await?;
        let issued: InstallationTokenResponse = response.json()?;

        self.token.store(Some(Arc::new(issued.token.clone())));
        if enterprise_host.is_some() {
            self.api_url.store(Arc::new(base_url));
        }

        tracing::info!(
            installation_id,
            namespace,
            expires_at = issued.expires_at.as_deref().unwrap_or(""),
            "Issued installation token"
        );
        Ok(issued.token)
    }

    async fn list_repository_urls(&self) -> Result<Vec<String>, GitHubError> {
        let mut urls = Vec::new();
        let mut page = 1;

        loop {
            let response = self.list_repos(REPOS_PER_PAGE, page).await?;
            if response.repositories.is_empty() {
                break;
            }
            urls.extend(response.repositories.into_iter().map(|r| r.html_url));
            if urls.len() as u64 >= response.total_count {
                break;
            }
            page += 1;
        }

        Ok(urls)
    }
}

#[async_trait]
impl StatusApi for GitHubClient {
    fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    async fn find_check_run(
        &self,
        event: &RunEvent,
        external_id: &str,
    ) -> Result<Option<i64>, GitHubError> {
        let mut seen = 0u64;
        let mut page = 1;

        loop {
            let mut url = self.repo_url(
                event,
                &format!(
                    "commits/{}/check-runs?per_page={}&page={}",
                    event.sha, CHECK_RUNS_PER_PAGE, page
                ),
            );
            if let Some(app_id) = self.application_id() {
                url.push_str(&format!("&app_id={}", app_id));
            }

            let response: ListCheckRunsResponse = self.get(&url).await?;
            if response.check_runs.is_empty() {
                return Ok(None);
            }
            seen += response.check_runs.len() as u64;

            if let Some(run) = response
                .check_runs
                .into_iter()
                .find(|run| run.external_id.as_deref() == Some(external_id))
            {
                return Ok(Some(run.id));
            }
            if seen >= response.total_count {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn create_check_run(
        &self,
        event: &RunEvent,
        request: &CreateCheckRun,
    ) -> Result<i64, GitHubError> {
        let response = self.post(&self.repo_url(event, "check-runs"), request).await?;
        let created: CreatedResource = response.json()?;
        Ok(created.id)
    }

    async fn update_check_run(
        &self,
        event: &RunEvent,
        check_run_id: i64,
        request: &UpdateCheckRun,
    ) -> Result<(), GitHubError> {
        let url = self.repo_url(event, &format!("check-runs/{}", check_run_id));
        self.patch(&url, request).await?;
        Ok(())
    }

    async fn create_commit_status(
        &self,
        event: &RunEvent,
        request: &CreateCommitStatus,
    ) -> Result<(), GitHubError> {
        let url = self.repo_url(event, &format!("statuses/{}", event.sha));
        self.post(&url, request).await?;
        Ok(())
    }

    async fn create_comment(
        &self,
        event: &RunEvent,
        issue_number: u64,
        request: &CreateComment,
    ) -> Result<(), GitHubError> {
        let url = self.repo_url(event, &format!("issues/{}/comments", issue_number));
        self.post(&url, request).await?;
        Ok(())
    }
}
