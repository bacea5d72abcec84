//! Shared server state

use crate::core::extractor::Extractor;
use crate::core::jobs::JobManager;
use crate::storage::downloads::DownloadDir;
use crate::types::Config;
use std::sync::Arc;
use std::time::Duration;

/// Everything a handler needs, built once at startup
pub struct AppState {
    pub config: Config,
    pub jobs: JobManager,
}

impl AppState {
    pub fn new(config: Config, extractor: Arc<dyn Extractor>) -> Arc<Self> {
        let jobs = JobManager::new(
            DownloadDir::new(config.download_dir.clone()),
            extractor,
            config.max_concurrent_downloads,
        )
        .with_retention(Duration::from_secs(config.job_retention_secs));
        Arc::new(Self { config, jobs })
    }
}
