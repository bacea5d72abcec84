//! In-memory job table

use crate::types::{Job, JobId, JobState};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Jobs keyed by id, shared between request handlers and background workers.
///
/// Finished entries (`Completed` or `Failed`) are dropped once they have not
/// changed for the retention period. Live entries stay until they finish.
#[derive(Debug)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
    retention: Duration,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self { jobs: RwLock::new(HashMap::new()), retention }
    }

    /// Record a freshly accepted job, pruning expired entries first
    pub async fn insert(&self, job: Job) {
        let mut jobs = self.jobs.write().await;
        self.prune_locked(&mut jobs);
        jobs.insert(job.id, job);
    }

    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn state(&self, id: &JobId) -> Option<JobState> {
        self.jobs.read().await.get(id).map(|job| job.state.clone())
    }

    /// Move a job to a new state; returns false for unknown ids
    pub async fn set_state(&self, id: &JobId, state: JobState) -> bool {
        match self.jobs.write().await.get_mut(id) {
            Some(job) => {
                job.state = state;
                job.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &JobId) -> Option<Job> {
        self.jobs.write().await.remove(id)
    }

    /// Drop finished entries older than the retention period
    pub async fn prune(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        self.prune_locked(&mut jobs)
    }

    fn prune_locked(&self, jobs: &mut HashMap<JobId, Job>) -> usize {
        let now = Utc::now();
        let before = jobs.len();
        jobs.retain(|_, job| {
            let finished =
                matches!(job.state, JobState::Completed { .. } | JobState::Failed { .. });
            let expired = (now - job.updated_at)
                .to_std()
                .map(|age| age > self.retention)
                .unwrap_or(false);
            !(finished && expired)
        });
        let pruned = before - jobs.len();
        if pruned > 0 {
            debug!(pruned, remaining = jobs.len(), "pruned finished jobs");
        }
        pruned
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
