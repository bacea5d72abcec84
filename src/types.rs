//! Type definitions for tubefetch
//!
//! Source of truth for all data structures.

use crate::error::{Result, TubeFetchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

// ============================================
// Job Identity
// ============================================

/// Opaque job identifier, a random 128-bit UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mint a fresh identifier
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for JobId {
    type Err = TubeFetchError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| TubeFetchError::InvalidJobId(s.to_string()))
    }
}

// ============================================
// Job Options
// ============================================

/// Requested output container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp3,
    #[default]
    Mp4,
}

impl OutputFormat {
    /// Every format a finished job can be found under, in lookup order
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Mp4, OutputFormat::Mp3];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Mp3)
    }

    /// Prefix of the filename shown to the client
    pub fn role(&self) -> &'static str {
        if self.is_audio() { "audio" } else { "video" }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Mp4 => "video/mp4",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = TubeFetchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "mp4" => Ok(Self::Mp4),
            other => Err(TubeFetchError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Requested quality, interpreted loosely
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Highest,
    Lowest,
    /// Cap on video height, e.g. "720p"
    MaxHeight(u32),
}

impl Quality {
    /// Never fails: anything unrecognised means "highest"
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim().to_ascii_lowercase();
        match value.as_str() {
            "lowest" | "worst" => Self::Lowest,
            "highest" | "best" | "" => Self::Highest,
            other => other
                .trim_end_matches('p')
                .parse::<u32>()
                .ok()
                .filter(|h| *h > 0)
                .map(Self::MaxHeight)
                .unwrap_or(Self::Highest),
        }
    }
}

/// Options passed through to the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobOptions {
    pub quality: Quality,
    pub format: OutputFormat,
}

// ============================================
// Media Types
// ============================================

/// Metadata returned by a probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub author: String,
    pub duration_seconds: u64,
}

impl Default for MediaInfo {
    fn default() -> Self {
        Self {
            title: "video".into(),
            author: "unknown".into(),
            duration_seconds: 0,
        }
    }
}

// ============================================
// Job Types
// ============================================

/// Lifecycle of a job, owned by the job table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Accepted, waiting for a worker slot
    Submitted,
    /// Collaborator fetch in flight
    Processing,
    Completed { path: PathBuf },
    Failed { reason: String },
}

/// One accepted submission
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    /// Exactly as submitted
    pub source_url: String,
    pub options: JobOptions,
    pub info: MediaInfo,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================
// HTTP Types
// ============================================

/// Body of `POST /api/download`
///
/// `quality` and `file_type` may be missing or `null`; both mean the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }

    pub fn options(&self) -> Result<JobOptions> {
        let quality = self.quality.as_deref().map(Quality::parse).unwrap_or_default();
        let format = match self.file_type.as_deref() {
            Some(file_type) => file_type.parse()?,
            None => OutputFormat::default(),
        };
        Ok(JobOptions { quality, format })
    }
}

/// Reply to an accepted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub download_id: JobId,
    pub message: String,
    pub title: String,
    pub author: String,
    /// Duration in seconds
    pub length: u64,
}

/// Externally visible job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
}

/// Reply to `GET /api/status/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StatusResponse {
    pub fn processing() -> Self {
        Self { status: JobStatus::Processing, detail: None }
    }

    pub fn completed() -> Self {
        Self { status: JobStatus::Completed, detail: None }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self { status: JobStatus::Error, detail: Some(detail.into()) }
    }
}

// ============================================
// Config Types
// ============================================

/// Server configuration, passed to constructors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Where finished files land, one per job
    pub download_dir: PathBuf,
    /// Served under `/static` when set
    pub static_dir: Option<PathBuf>,
    /// yt-dlp executable
    pub ytdlp_path: String,
    /// Netscape cookie jar handed to yt-dlp
    pub cookies_file: Option<PathBuf>,
    /// Upper bound on simultaneous background downloads
    pub max_concurrent_downloads: usize,
    /// How long a finished job stays in the job table, in seconds
    pub job_retention_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            download_dir: PathBuf::from("downloads"),
            static_dir: None,
            ytdlp_path: "yt-dlp".into(),
            cookies_file: None,
            max_concurrent_downloads: 3,
            job_retention_secs: 3600,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_downloads == 0 {
            return Err(TubeFetchError::InvalidConfig(
                "max_concurrent_downloads must be at least 1".into(),
            ));
        }
        if self.ytdlp_path.trim().is_empty() {
            return Err(TubeFetchError::InvalidConfig("ytdlp_path is empty".into()));
        }
        Ok(())
    }
}
