// In-Memory Job Store
//
// Replaces what would otherwise be a module-level global registry with an
// explicitly constructed store handed to the RPC handler and bridge tasks.
// Jobs are never persisted and never evicted within the process lifetime;
// accumulation is observable through count_by_status.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::job::{Job, JobId, JobSnapshot, JobStatus};
use crate::error::{AppError, Result};

/// Process-wide registry keyed by job id
///
/// All mutation is funnelled through [`JobStore::update`] so the state
/// machine invariants on [`Job`] cannot be bypassed by callers.
#[derive(Default)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created job
    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id().to_string(), job);
    }

    /// Snapshot of one job, or NotFound
    pub async fn snapshot(&self, id: &str) -> Result<JobSnapshot> {
        self.jobs
            .read()
            .await
            .get(id)
            .map(Job::snapshot)
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    /// Run `f` against the job under the write lock
    ///
    /// The closure is synchronous and short-lived by construction; errors it
    /// returns (invalid transitions etc.) propagate to the caller unchanged.
    pub async fn update<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Job) -> Result<T>,
    ) -> Result<T> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
        f(job)
    }

    /// Number of jobs currently in `status`
    pub async fn count_by_status(&self, status: JobStatus) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|j| j.status() == status)
            .count()
    }

    /// Total number of tracked jobs (no eviction exists)
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
