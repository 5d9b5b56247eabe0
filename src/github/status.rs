//! Pipeline status reporting onto GitHub commits.
//!
//! A status write goes through one of two sinks:
//! - [`CheckRunSink`] keeps a single check run per pipeline run and updates
//!   it in place. Only available with GitHub App installation tokens.
//! - [`CommitStatusSink`] posts a classic commit status, plus a pull request
//!   comment carrying the run output once the run completes.
//!
//! [`StatusReporter`] picks the sink once per run event and owns the
//! check run cache shared by every write made through it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument;

use super::cache::CheckRunCache;
use super::types::{
    CheckRunOutput, CreateCheckRun, CreateComment, CreateCommitStatus, UpdateCheckRun,
};
use super::GitHubError;

/// Lifecycle state of a pipeline run as GitHub sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Queued => "queued",
            CheckStatus::InProgress => "in_progress",
            CheckStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(CheckStatus::Queued),
            "in_progress" => Ok(CheckStatus::InProgress),
            "completed" => Ok(CheckStatus::Completed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Outcome of a pipeline run. An empty conclusion is modelled as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Skipped,
    Neutral,
    Pending,
}

impl Conclusion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Skipped => "skipped",
            Conclusion::Neutral => "neutral",
            Conclusion::Pending => "pending",
        }
    }

    /// Whether this conclusion finishes a check run.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Conclusion::Pending)
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Conclusion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Conclusion::Success),
            "failure" => Ok(Conclusion::Failure),
            "skipped" => Ok(Conclusion::Skipped),
            "neutral" => Ok(Conclusion::Neutral),
            "pending" => Ok(Conclusion::Pending),
            other => Err(format!("unknown conclusion: {}", other)),
        }
    }
}

/// A single status write for a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusOpts {
    /// Unique run name, used as the check run external ID and cache key
    pub pipeline_run_name: String,
    /// Name of the pipeline definition the run was created from
    pub original_pipeline_run_name: String,
    pub status: CheckStatus,
    pub conclusion: Option<Conclusion>,
    pub title: String,
    pub summary: String,
    pub text: String,
    pub details_url: String,
}

impl StatusOpts {
    pub fn new(pipeline_run_name: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            pipeline_run_name: pipeline_run_name.into(),
            original_pipeline_run_name: String::new(),
            status,
            conclusion: None,
            title: String::new(),
            summary: String::new(),
            text: String::new(),
            details_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    PullRequest,
    Push,
    Other,
}

/// The repository event that triggered a pipeline run.
#[derive(Debug, Clone)]
pub struct RunEvent {
    pub organization: String,
    pub repository: String,
    pub sha: String,
    pub event_type: EventType,
    pub pull_request_number: Option<u64>,
    /// Status info must come from the commit, not from an App-scoped
    /// resource. Set when no App installation token is available.
    pub info_from_repo: bool,
}

/// Per-deployment settings applied to every status write.
#[derive(Debug, Clone, Default)]
pub struct ReporterOptions {
    /// Display name prefixed to summaries and used as the check name
    pub application_name: String,
    /// Link attached to newly created check runs
    pub log_url: String,
}

/// Name shown for the check run or commit status context.
pub fn check_name(status: &StatusOpts, options: &ReporterOptions) -> String {
    if options.application_name.is_empty() {
        return status.original_pipeline_run_name.clone();
    }
    if status.original_pipeline_run_name.is_empty() {
        return options.application_name.clone();
    }
    format!(
        "{} / {}",
        options.application_name, status.original_pipeline_run_name
    )
}

/// Fill in title and summary from the conclusion and status.
///
/// Table values replace whatever the caller supplied. The summary is then
/// prefixed with the application name and, when present, the original
/// pipeline run name.
pub fn apply_display_text(status: &mut StatusOpts, options: &ReporterOptions) {
    let derived = match status.conclusion {
        Some(Conclusion::Success) => Some(("Success", "has <b>successfully</b> validated your commit.")),
        Some(Conclusion::Failure) => Some(("Failed", "has <b>failed</b>.")),
        Some(Conclusion::Skipped) => Some(("Skipped", "is skipping this commit.")),
        Some(Conclusion::Neutral) => Some(("Unknown", "doesn't know what happened with this commit.")),
        Some(Conclusion::Pending) | None => None,
    };
    if let Some((title, summary)) = derived {
        status.title = title.to_string();
        status.summary = summary.to_string();
    }

    if status.status == CheckStatus::InProgress {
        status.title = "CI has Started".to_string();
        status.summary = "is running.".to_string();
    }

    let on_pr = if status.original_pipeline_run_name.is_empty() {
        String::new()
    } else {
        format!("/{}", status.original_pipeline_run_name)
    };
    status.summary = format!("{}{} {}", options.application_name, on_pr, status.summary);
}

/// Remote operations needed to publish statuses.
#[async_trait]
pub trait StatusApi: Send + Sync {
    /// Whether credentials are configured at all.
    fn is_authenticated(&self) -> bool;

    /// Find a check run on `event.sha` created by this App whose external
    /// ID equals `external_id`.
    async fn find_check_run(
        &self,
        event: &RunEvent,
        external_id: &str,
    ) -> Result<Option<i64>, GitHubError>;

    async fn create_check_run(
        &self,
        event: &RunEvent,
        request: &CreateCheckRun,
    ) -> Result<i64, GitHubError>;

    async fn update_check_run(
        &self,
        event: &RunEvent,
        check_run_id: i64,
        request: &UpdateCheckRun,
    ) -> Result<(), GitHubError>;

    async fn create_commit_status(
        &self,
        event: &RunEvent,
        request: &CreateCommitStatus,
    ) -> Result<(), GitHubError>;

    async fn create_comment(
        &self,
        event: &RunEvent,
        issue_number: u64,
        request: &CreateComment,
    ) -> Result<(), GitHubError>;
}

/// Somewhere a status write ends up.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn create_or_update(
        &self,
        event: &RunEvent,
        options: &ReporterOptions,
        status: &StatusOpts,
    ) -> Result<(), GitHubError>;
}

/// Check run backend. Requires an App installation token.
pub struct CheckRunSink<'a> {
    api: &'a dyn StatusApi,
    cache: &'a CheckRunCache,
}

impl<'a> CheckRunSink<'a> {
    pub fn new(api: &'a dyn StatusApi, cache: &'a CheckRunCache) -> Self {
        Self { api, cache }
    }
}

/// Build the check run update for `status`.
///
/// `completed_at` and `conclusion` are set together, and only for a
/// terminal conclusion.
pub fn check_run_update(name: String, status: &StatusOpts, now: DateTime<Utc>) -> UpdateCheckRun {
    let (completed_at, conclusion) = match status.conclusion {
        Some(conclusion) if conclusion.is_terminal() => (Some(now), Some(conclusion)),
        _ => (None, None),
    };

    UpdateCheckRun {
        name,
        status: status.status,
        output: CheckRunOutput {
            title: status.title.clone(),
            summary: status.summary.clone(),
            text: status.text.clone(),
        },
        details_url: non_empty(&status.details_url),
        completed_at,
        conclusion,
    }
}

#[async_trait]
impl StatusSink for CheckRunSink<'_> {
    async fn create_or_update(
        &self,
        event: &RunEvent,
        options: &ReporterOptions,
        status: &StatusOpts,
    ) -> Result<(), GitHubError> {
        let name = check_name(status, options);
        let create = CreateCheckRun {
            name: name.clone(),
            head_sha: event.sha.clone(),
            status: CheckStatus::InProgress,
            details_url: non_empty(&options.log_url),
            external_id: status.pipeline_run_name.clone(),
            started_at: Utc::now(),
        };

        let check_run_id = self.cache.get_or_create(self.api, event, &create).await?;

        let update = check_run_update(name, status, Utc::now());
        self.api.update_check_run(event, check_run_id, &update).await
    }
}

/// Commit status backend, used when no App token is available.
pub struct CommitStatusSink<'a> {
    api: &'a dyn StatusApi,
}

impl<'a> CommitStatusSink<'a> {
    pub fn new(api: &'a dyn StatusApi) -> Self {
        Self { api }
    }
}

/// State sent to the commit status API.
///
/// Statuses have no skipped or neutral state, so those degrade to success.
/// A run still in progress is always pending.
pub fn commit_status_state(status: &StatusOpts) -> Option<Conclusion> {
    if status.status == CheckStatus::InProgress {
        return Some(Conclusion::Pending);
    }
    match status.conclusion {
        Some(Conclusion::Skipped) | Some(Conclusion::Neutral) => Some(Conclusion::Success),
        other => other,
    }
}

pub fn commit_status_request(
    context: String,
    status: &StatusOpts,
    now: DateTime<Utc>,
) -> CreateCommitStatus {
    CreateCommitStatus {
        state: commit_status_state(status)
            .map(|c| c.as_str().to_string())
            .unwrap_or_default(),
        target_url: status.details_url.clone(),
        description: status.title.clone(),
        context,
        created_at: now,
    }
}

#[async_trait]
impl StatusSink for CommitStatusSink<'_> {
    async fn create_or_update(
        &self,
        event: &RunEvent,
        options: &ReporterOptions,
        status: &StatusOpts,
    ) -> Result<(), GitHubError> {
        let request = commit_status_request(check_name(status, options), status, Utc::now());
        self.api.create_commit_status(event, &request).await?;

        let wants_comment = status.status == CheckStatus::Completed
            && !status.text.is_empty()
            && event.event_type == EventType::PullRequest;
        if !wants_comment {
            return Ok(());
        }

        let number = event.pull_request_number.ok_or_else(|| {
            GitHubError::Protocol("pull request event without a pull request number".to_string())
        })?;
        let comment = CreateComment {
            body: format!("{}<br>{}", status.summary, status.text),
        };
        self.api.create_comment(event, number, &comment).await
    }
}

/// Publishes pipeline run statuses through a provider client.
///
/// One reporter per provider client: its check run cache guarantees a
/// single check run per pipeline run name for the reporter's lifetime.
pub struct StatusReporter {
    api: Arc<dyn StatusApi>,
    check_runs: CheckRunCache,
}

impl StatusReporter {
    pub fn new(api: Arc<dyn StatusApi>) -> Self {
        Self {
            api,
            check_runs: CheckRunCache::new(),
        }
    }

    pub fn check_runs(&self) -> &CheckRunCache {
        &self.check_runs
    }

    /// Select the backend for a run event.
    pub fn sink_for(&self, event: &RunEvent) -> Box<dyn StatusSink + '_> {
        if event.info_from_repo {
            Box::new(CommitStatusSink::new(&*self.api))
        } else {
            Box::new(CheckRunSink::new(&*self.api, &self.check_runs))
        }
    }

    /// Publish one status write for a pipeline run.
    #[instrument(skip_all, fields(
        run = %status.pipeline_run_name,
        status = %status.status,
        org = %event.organization,
        repo = %event.repository,
    ))]
    pub async fn report(
        &self,
        event: &RunEvent,
        options: &ReporterOptions,
        mut status: StatusOpts,
    ) -> Result<(), GitHubError> {
        if !self.api.is_authenticated() {
            return Err(GitHubError::NotAuthenticated);
        }

        apply_display_text(&mut status, options);

        self.sink_for(event)
            .create_or_update(event, options, &status)
            .await?;

        tracing::debug!(conclusion = ?status.conclusion, "Reported pipeline status");
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
