//! Download directory: where finished files live, one per job

use crate::error::Result;
use crate::types::{JobId, OutputFormat};
use crate::utils::paths::ensure_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A finished output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub format: Option<OutputFormat>,
}

impl OutputFile {
    pub fn new(path: PathBuf) -> Self {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok());
        Self { path, format }
    }

    /// Filename offered to the client, e.g. `video_{id}.mp4`
    pub fn display_name(&self, id: &JobId) -> String {
        let ext = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");
        let role = match self.format {
            Some(format) => format.role(),
            None if is_audio_extension(ext) => "audio",
            None => "video",
        };
        format!("{}_{}.{}", role, id, ext)
    }

    pub fn content_type(&self) -> &'static str {
        if let Some(format) = self.format {
            return format.content_type();
        }
        let ext = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            "m4a" => "audio/mp4",
            "opus" | "ogg" => "audio/ogg",
            _ => "application/octet-stream",
        }
    }
}

fn is_audio_extension(ext: &str) -> bool {
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "mp3" | "m4a" | "aac" | "opus" | "ogg" | "wav" | "flac"
    )
}

/// Flat directory of `{id}.{ext}` files
#[derive(Debug, Clone)]
pub struct DownloadDir {
    root: PathBuf,
}

impl DownloadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory if needed
    pub async fn ensure(&self) -> Result<()> {
        ensure_dir(&self.root).await
    }

    /// Template handed to the collaborator; it fills in the extension
    pub fn output_template(&self, id: &JobId) -> PathBuf {
        self.root.join(format!("{}.%(ext)s", id))
    }

    pub fn expected_path(&self, id: &JobId, format: OutputFormat) -> PathBuf {
        self.root.join(format!("{}.{}", id, format.extension()))
    }

    /// Whether `path` is one of the names the presence check looks for
    pub fn is_discoverable(&self, id: &JobId, path: &Path) -> bool {
        OutputFormat::ALL
            .iter()
            .any(|format| self.expected_path(id, *format) == path)
    }

    /// Presence check for `{id}.mp4`, then `{id}.mp3`.
    ///
    /// A file that exists counts as finished; yt-dlp writes to a `.part`
    /// name and renames on completion.
    pub async fn find_output(&self, id: &JobId) -> Result<Option<OutputFile>> {
        for format in OutputFormat::ALL {
            let path = self.expected_path(id, format);
            if fs::try_exists(&path).await? {
                return Ok(Some(OutputFile { path, format: Some(format) }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_find_output_presence() {
        let tmp = TempDir::new().unwrap();
        let dir = DownloadDir::new(tmp.path());
        let id = JobId::new();

        assert_eq!(dir.find_output(&id).await.unwrap(), None);

        fs::write(dir.expected_path(&id, OutputFormat::Mp3), b"").await.unwrap();
        let found = dir.find_output(&id).await.unwrap().unwrap();
        assert_eq!(found.format, Some(OutputFormat::Mp3));
        assert_eq!(found.display_name(&id), format!("audio_{}.mp3", id));
    }

    #[tokio::test]
    async fn test_mp4_wins_over_mp3() {
        let tmp = TempDir::new().unwrap();
        let dir = DownloadDir::new(tmp.path());
        let id = JobId::new();

        fs::write(dir.expected_path(&id, OutputFormat::Mp3), b"a").await.unwrap();
        fs::write(dir.expected_path(&id, OutputFormat::Mp4), b"v").await.unwrap();

        let found = dir.find_output(&id).await.unwrap().unwrap();
        assert_eq!(found.display_name(&id), format!("video_{}.mp4", id));
        assert_eq!(found.content_type(), "video/mp4");
    }

    #[tokio::test]
    async fn test_partial_download_is_invisible() {
        let tmp = TempDir::new().unwrap();
        let dir = DownloadDir::new(tmp.path());
        let id = JobId::new();

        fs::write(tmp.path().join(format!("{}.mp4.part", id)), b"half").await.unwrap();
        assert_eq!(dir.find_output(&id).await.unwrap(), None);
    }

    #[test]
    fn test_templates_are_per_job() {
        let dir = DownloadDir::new("/srv/downloads");
        let (a, b) = (JobId::new(), JobId::new());

        assert_ne!(dir.output_template(&a), dir.output_template(&b));
        assert_eq!(
            dir.output_template(&a),
            PathBuf::from(format!("/srv/downloads/{}.%(ext)s", a))
        );
    }

    #[test]
    fn test_discoverable_paths() {
        let dir = DownloadDir::new("/srv/downloads");
        let id = JobId::new();

        assert!(dir.is_discoverable(&id, &dir.expected_path(&id, OutputFormat::Mp3)));
        assert!(dir.is_discoverable(&id, &dir.expected_path(&id, OutputFormat::Mp4)));
        assert!(!dir.is_discoverable(&id, Path::new(&format!("/srv/downloads/{}.webm", id))));
        assert!(!dir.is_discoverable(&JobId::new(), &dir.expected_path(&id, OutputFormat::Mp4)));
    }

    #[test]
    fn test_unexpected_extension_keeps_role() {
        let id = JobId::new();
        let webm = OutputFile::new(PathBuf::from(format!("/d/{}.webm", id)));
        assert_eq!(webm.format, None);
        assert_eq!(webm.display_name(&id), format!("video_{}.webm", id));
        assert_eq!(webm.content_type(), "video/webm");

        let m4a = OutputFile::new(PathBuf::from(format!("/d/{}.m4a", id)));
        assert_eq!(m4a.display_name(&id), format!("audio_{}.m4a", id));
    }
}
