//! Request and response payloads for the GitHub REST endpoints we call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{CheckStatus, Conclusion};

// Installation types

/// One entry of `GET /app/installations`.
///
/// `id` stays optional so a null identifier can be detected and rejected
/// instead of silently defaulting to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationRecord {
    pub id: Option<i64>,
    pub account: Option<InstallationAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallationAccount {
    pub login: String,
}

/// Response from `POST /app/installations/{id}/access_tokens`.
#[derive(Debug, Deserialize)]
pub struct InstallationTokenResponse {
    pub token: String,
    pub expires_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListReposResponse {
    pub total_count: u64,
    pub repositories: Vec<RepositoryRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRef {
    pub html_url: String,
}

// Check run types

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    pub external_id: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCheckRun {
    pub name: String,
    pub status: CheckStatus,
    pub output: CheckRunOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<Conclusion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCheckRunsResponse {
    pub total_count: u64,
    pub check_runs: Vec<CheckRunSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRunSummary {
    pub id: i64,
    pub external_id: Option<String>,
}

/// Any created resource we only need the ID of.
#[derive(Debug, Deserialize)]
pub struct CreatedResource {
    pub id: i64,
}

// Commit status and comment types

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCommitStatus {
    pub state: String,
    pub target_url: String,
    pub description: String,
    pub context: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateComment {
    pub body: String,
}
