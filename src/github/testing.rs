//! Test doubles shared by the status and cache tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::status::{EventType, RunEvent, StatusApi};
use super::types::{CreateCheckRun, CreateComment, CreateCommitStatus, UpdateCheckRun};
use super::GitHubError;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Find { external_id: String },
    Create(CreateCheckRun),
    Update { id: i64, request: UpdateCheckRun },
    Status(CreateCommitStatus),
    Comment { number: u64, body: String },
}

/// In-memory [`StatusApi`] that records every call.
pub struct MockStatusApi {
    authenticated: bool,
    existing: HashMap<String, i64>,
    update_failure: Option<u16>,
    lookup_failure: Option<u16>,
    create_delay: Option<Duration>,
    creates: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for MockStatusApi {
    fn default() -> Self {
        Self {
            authenticated: true,
            existing: HashMap::new(),
            update_failure: None,
            lookup_failure: None,
            create_delay: None,
            creates: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockStatusApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    pub fn with_existing_check_run(mut self, external_id: &str, id: i64) -> Self {
        self.existing.insert(external_id.to_string(), id);
        self
    }

    pub fn failing_updates(mut self, status: u16) -> Self {
        self.update_failure = Some(status);
        self
    }

    pub fn failing_lookups(mut self, status: u16) -> Self {
        self.lookup_failure = Some(status);
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<CreateCheckRun> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Create(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(i64, UpdateCheckRun)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Update { id, request } => Some((id, request)),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<CreateCommitStatus> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Status(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StatusApi for MockStatusApi {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn find_check_run(
        &self,
        _event: &RunEvent,
        external_id: &str,
    ) -> Result<Option<i64>, GitHubError> {
        self.record(RecordedCall::Find {
            external_id: external_id.to_string(),
        });
        if let Some(status) = self.lookup_failure {
            return Err(GitHubError::transport("mock://check-runs", status));
        }
        Ok(self.existing.get(external_id).copied())
    }

    async fn create_check_run(
        &self,
        _event: &RunEvent,
        request: &CreateCheckRun,
    ) -> Result<i64, GitHubError> {
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        let n = self.creates.fetch_add(1, Ordering::SeqCst);
        self.record(RecordedCall::Create(request.clone()));
        Ok(1000 + n as i64)
    }

    async fn update_check_run(
        &self,
        _event: &RunEvent,
        check_run_id: i64,
        request: &UpdateCheckRun,
    ) -> Result<(), GitHubError> {
        self.record(RecordedCall::Update {
            id: check_run_id,
            request: request.clone(),
        });
        match self.update_failure {
            Some(status) => Err(GitHubError::transport("mock://check-runs/update", status)),
            None => Ok(()),
        }
    }

    async fn create_commit_status(
        &self,
        _event: &RunEvent,
        request: &CreateCommitStatus,
    ) -> Result<(), GitHubError> {
        self.record(RecordedCall::Status(request.clone()));
        Ok(())
    }

    async fn create_comment(
        &self,
        _event: &RunEvent,
        issue_number: u64,
        request: &CreateComment,
    ) -> Result<(), GitHubError> {
        self.record(RecordedCall::Comment {
            number: issue_number,
            body: request.body.clone(),
        });
        Ok(())
    }
}

pub fn push_event(info_from_repo: bool) -> RunEvent {
    RunEvent {
        organization: "octo-org".to_string(),
        repository: "hello-world".to_string(),
        sha: "6dcb09b5b57875f334f61aebed695e2e4193db5e".to_string(),
        event_type: EventType::Push,
        pull_request_number: None,
        info_from_repo,
    }
}

pub fn pull_request_event(info_from_repo: bool, number: u64) -> RunEvent {
    RunEvent {
        event_type: EventType::PullRequest,
        pull_request_number: Some(number),
        ..push_event(info_from_repo)
    }
}
