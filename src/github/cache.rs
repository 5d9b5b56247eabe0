//! Pipeline run to check run ID cache.
//!
//! Each entry is a once-initialized cell behind a `DashMap` shard lock. The
//! shard lock is held only long enough to fetch or insert the cell, so runs
//! with different names never wait on each other, while concurrent writers
//! for the same run share one lookup-or-create.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

use super::status::{RunEvent, StatusApi};
use super::types::CreateCheckRun;
use super::GitHubError;

/// Thread-safe map of pipeline run name -> remote check run ID.
#[derive(Debug, Default)]
pub struct CheckRunCache {
    entries: DashMap<String, Arc<OnceCell<i64>>>,
}

impl CheckRunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached check run ID for a pipeline run, if one has been resolved.
    pub fn load(&self, pipeline_run_name: &str) -> Option<i64> {
        self.entries
            .get(pipeline_run_name)
            .and_then(|cell| cell.get().copied())
    }

    /// Record the check run ID for a pipeline run, replacing any previous one.
    pub fn store(&self, pipeline_run_name: &str, check_run_id: i64) {
        self.entries.insert(
            pipeline_run_name.to_string(),
            Arc::new(OnceCell::from(check_run_id)),
        );
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `pipeline_run_name`, or run `init` to
    /// produce it. Concurrent callers for the same name wait for the first
    /// `init` instead of starting their own. A failed `init` leaves the entry
    /// empty so a later call can try again.
    ///
    /// ```
    /// use ci_status_sync::github::CheckRunCache;
    ///
    /// # tokio_test::block_on(async {
    /// let cache = CheckRunCache::new();
    /// let id = cache
    ///     .get_or_try_init("build-abc12", || async { Ok(42) })
    ///     .await
    ///     .unwrap();
    ///
    /// assert_eq!(id, 42);
    /// assert_eq!(cache.load("build-abc12"), Some(42));
    /// # });
    /// ```
    pub async fn get_or_try_init<F, Fut>(
        &self,
        pipeline_run_name: &str,
        init: F,
    ) -> Result<i64, GitHubError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<i64, GitHubError>>,
    {
        let cell = self
            .entries
            .entry(pipeline_run_name.to_string())
            .or_default()
            .clone();

        cell.get_or_try_init(init).await.copied()
    }

    /// Resolve the check run for `create.external_id`.
    ///
    /// Order: local cache, then an existing check run on the commit created
    /// by this App with a matching external ID, then a new in-progress check
    /// run. The result is cached before returning.
    pub async fn get_or_create(
        &self,
        api: &dyn StatusApi,
        event: &RunEvent,
        create: &CreateCheckRun,
    ) -> Result<i64, GitHubError> {
        let run_name = create.external_id.as_str();

        self.get_or_try_init(run_name, || async move {
            match api.find_check_run(event, run_name).await {
                Ok(Some(id)) => {
                    tracing::debug!(run = run_name, check_run_id = id, "Reusing existing check run");
                    return Ok(id);
                }
                Ok(None) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    tracing::warn!(run = run_name, error = %e, "Failed to look up existing check run");
                }
            }

            let id = api.create_check_run(event, create).await?;
            tracing::info!(run = run_name, check_run_id = id, sha = %event.sha, "Created check run");
            Ok(id)
        })
        .await
    }
}
