//! Job lifecycle: submission, background fetch, status and retrieval

use crate::core::extractor::Extractor;
use crate::core::validator::validate_url;
use crate::error::{Result, TubeFetchError};
use crate::storage::downloads::{DownloadDir, OutputFile};
use crate::storage::jobs::JobStore;
use crate::types::{
    DownloadRequest, DownloadResponse, Job, JobId, JobOptions, JobState, StatusResponse,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Owns the job table and the bounded pool of background fetches
pub struct JobManager {
    extractor: Arc<dyn Extractor>,
    store: Arc<JobStore>,
    downloads: DownloadDir,
    permits: Arc<Semaphore>,
}

impl JobManager {
    pub fn new(
        downloads: DownloadDir,
        extractor: Arc<dyn Extractor>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            extractor,
            store: Arc::new(JobStore::new()),
            downloads,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Keep finished jobs in the table for `retention` after they finish
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.store = Arc::new(JobStore::with_retention(retention));
        self
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Validate, probe, record and schedule a download.
    ///
    /// Returns as soon as metadata is known; the fetch itself runs detached.
    pub async fn submit(&self, request: &DownloadRequest) -> Result<DownloadResponse> {
        let (response, _handle) = self.submit_detached(request).await?;
        Ok(response)
    }

    /// Like [`submit`](Self::submit), also handing back the background task
    pub async fn submit_detached(
        &self,
        request: &DownloadRequest,
    ) -> Result<(DownloadResponse, JoinHandle<()>)> {
        info!(url = %request.url, file_type = ?request.file_type, "download requested");

        let url = validate_url(&request.url)?.to_string();
        let options = request.options()?;
        let id = JobId::new();

        let info = match self.extractor.probe(&url, &options).await {
            Ok(info) => info,
            Err(e) => {
                warn!(%id, %url, error = %e, "probe failed");
                return Err(match e {
                    TubeFetchError::Extraction(_) => e,
                    other => TubeFetchError::Extraction(other.to_string()),
                });
            }
        };
        info!(%id, title = %info.title, extractor = self.extractor.name(), "probe succeeded");

        let now = Utc::now();
        self.store
            .insert(Job {
                id,
                source_url: url.clone(),
                options,
                info: info.clone(),
                state: JobState::Submitted,
                submitted_at: now,
                updated_at: now,
            })
            .await;

        let handle = self.spawn_fetch(id, url, options);

        Ok((
            DownloadResponse {
                download_id: id,
                message: "Download started".into(),
                title: info.title,
                author: info.author,
                length: info.duration_seconds,
            },
            handle,
        ))
    }

    /// Run the collaborator fetch outside the request path.
    ///
    /// Waits for a worker slot, then records the outcome. No retry: one
    /// failed attempt is final for the job.
    fn spawn_fetch(&self, id: JobId, url: String, options: JobOptions) -> JoinHandle<()> {
        let extractor = Arc::clone(&self.extractor);
        let store = Arc::clone(&self.store);
        let permits = Arc::clone(&self.permits);
        let downloads = self.downloads.clone();
        let template = downloads.output_template(&id);

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!(%id, "worker pool closed before fetch could start");
                    store
                        .set_state(&id, JobState::Failed { reason: "worker pool closed".into() })
                        .await;
                    return;
                }
            };

            store.set_state(&id, JobState::Processing).await;
            let started = Utc::now();
            info!(%id, %url, "fetch started");

            match extractor.fetch(&url, &options, &template).await {
                Ok(path) => {
                    let elapsed = (Utc::now() - started).num_seconds();
                    info!(%id, path = %path.display(), elapsed_secs = elapsed, "fetch finished");
                    // the presence check finds `{id}.mp4`/`{id}.mp3` on its own
                    if downloads.is_discoverable(&id, &path) {
                        debug!(%id, "dropping completed job from the table");
                        store.remove(&id).await;
                    } else {
                        store.set_state(&id, JobState::Completed { path }).await;
                    }
                }
                Err(e) => {
                    error!(%id, %url, error = %e, "fetch failed");
                    store
                        .set_state(&id, JobState::Failed { reason: e.to_string() })
                        .await;
                }
            }
        })
    }

    /// Externally visible status of a job.
    ///
    /// Unknown ids with no file on disk read as `processing`, so jobs from a
    /// previous run are still discoverable through the filesystem.
    pub async fn status(&self, id: &JobId) -> StatusResponse {
        if let Some(JobState::Failed { reason }) = self.store.state(id).await {
            return StatusResponse::error(reason);
        }

        match self.locate(id).await {
            Ok(Some(_)) => StatusResponse::completed(),
            Ok(None) => StatusResponse::processing(),
            Err(e) => {
                error!(%id, error = %e, "status check failed");
                StatusResponse::error(e.to_string())
            }
        }
    }

    /// The finished file for a job, or `NotFound`
    pub async fn output(&self, id: &JobId) -> Result<OutputFile> {
        self.locate(id).await?.ok_or(TubeFetchError::NotFound)
    }

    async fn locate(&self, id: &JobId) -> Result<Option<OutputFile>> {
        if let Some(JobState::Completed { path }) = self.store.state(id).await {
            if tokio::fs::try_exists(&path).await? {
                return Ok(Some(OutputFile::new(path)));
            }
            warn!(%id, path = %path.display(), "recorded output is gone");
        }
        self.downloads.find_output(id).await
    }
}
