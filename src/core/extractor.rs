//! Extraction collaborator seam

use crate::error::Result;
use crate::types::{JobOptions, MediaInfo};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// External tool that resolves media URLs and writes the downloaded file
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of the collaborator (for logging)
    fn name(&self) -> &'static str;

    /// Metadata-only lookup; must not write any file
    async fn probe(&self, url: &str, options: &JobOptions) -> Result<MediaInfo>;

    /// Download `url` to a path derived from `output_template`.
    ///
    /// The template carries a `%(ext)s` placeholder; the returned path is the
    /// file the collaborator actually produced.
    async fn fetch(
        &self,
        url: &str,
        options: &JobOptions,
        output_template: &Path,
    ) -> Result<PathBuf>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::error::TubeFetchError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Scripted extractor for tests
    #[derive(Default)]
    pub struct FakeExtractor {
        pub probe_error: Option<String>,
        pub fetch_error: Option<String>,
        /// Extension written by `fetch`; defaults to the requested one
        pub produced_ext: Option<String>,
        /// When set, `fetch` waits for a notification before writing
        pub gate: Option<Notify>,
        pub probes: AtomicUsize,
        pub fetches: AtomicUsize,
        pub fetched: Mutex<Vec<PathBuf>>,
    }

    impl FakeExtractor {
        pub fn failing_probe(reason: &str) -> Self {
            Self { probe_error: Some(reason.into()), ..Self::default() }
        }

        pub fn failing_fetch(reason: &str) -> Self {
            Self { fetch_error: Some(reason.into()), ..Self::default() }
        }

        pub fn gated() -> Self {
            Self { gate: Some(Notify::new()), ..Self::default() }
        }

        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.notify_one();
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn probe(&self, url: &str, _options: &JobOptions) -> Result<MediaInfo> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if let Some(reason) = &self.probe_error {
                return Err(TubeFetchError::Extraction(reason.clone()));
            }
            Ok(MediaInfo {
                title: format!("Title of {}", url),
                author: "Uploader".into(),
                duration_seconds: 212,
            })
        }

        async fn fetch(
            &self,
            _url: &str,
            options: &JobOptions,
            output_template: &Path,
        ) -> Result<PathBuf> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(reason) = &self.fetch_error {
                return Err(TubeFetchError::Fetch(reason.clone()));
            }

            let ext = self
                .produced_ext
                .clone()
                .unwrap_or_else(|| options.format.extension().to_string());
            let path = PathBuf::from(
                output_template.to_string_lossy().replace("%(ext)s", &ext),
            );
            tokio::fs::write(&path, b"media bytes").await?;
            if let Ok(mut fetched) = self.fetched.lock() {
                fetched.push(path.clone());
            }
            Ok(path)
        }
    }
}
