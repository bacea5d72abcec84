//! yt-dlp integration

use crate::core::extractor::Extractor;
use crate::error::{Result, TubeFetchError};
use crate::types::{JobOptions, MediaInfo, OutputFormat, Quality};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::debug;

static ERROR_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ERROR:\s*(?:\[[^\]]+\]\s*(?:[\w-]+:\s*)?)?").expect("Invalid regex")
});

/// Subset of `yt-dlp -J` output we care about
#[derive(Debug, Deserialize)]
struct ProbeJson {
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
}

impl From<ProbeJson> for MediaInfo {
    fn from(json: ProbeJson) -> Self {
        let defaults = MediaInfo::default();
        Self {
            title: json.title.filter(|t| !t.trim().is_empty()).unwrap_or(defaults.title),
            author: json.uploader.filter(|a| !a.trim().is_empty()).unwrap_or(defaults.author),
            duration_seconds: json
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d.round() as u64)
                .unwrap_or(defaults.duration_seconds),
        }
    }
}

/// yt-dlp driven through its command line
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    cookies: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), cookies: None }
    }

    pub fn with_cookies(mut self, cookies: Option<PathBuf>) -> Self {
        self.cookies = cookies;
        self
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec!["--no-playlist".to_string(), "--no-warnings".to_string()];
        if let Some(ref cookies) = self.cookies {
            args.push("--cookies".into());
            args.push(cookies.to_string_lossy().into_owned());
        }
        args
    }

    fn probe_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["-J".to_string()];
        args.extend(self.common_args());
        args.push(url.to_string());
        args
    }

    fn fetch_args(&self, url: &str, options: &JobOptions, output_template: &Path) -> Vec<String> {
        let mut args = self.common_args();
        args.extend([
            "--print".into(),
            "after_move:filepath".into(),
            "-o".into(),
            output_template.to_string_lossy().into_owned(),
            "-f".into(),
            format_selector(options),
        ]);

        match options.format {
            OutputFormat::Mp3 => args.extend([
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                "0".into(),
            ]),
            OutputFormat::Mp4 => args.extend(["--remux-video".into(), "mp4".into()]),
        }

        args.push(url.to_string());
        args
    }

    async fn run(&self, args: &[String]) -> Result<Output> {
        debug!(program = %self.program, ?args, "running collaborator");

        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    TubeFetchError::MissingDependency(self.program.clone())
                } else {
                    TubeFetchError::Spawn(format!("Failed to start {}: {}", self.program, e))
                }
            })?;

        Ok(output)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl Extractor for YtDlp {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str, _options: &JobOptions) -> Result<MediaInfo> {
        let output = self.run(&self.probe_args(url)).await?;
        if !output.status.success() {
            return Err(TubeFetchError::Extraction(failure_reason(
                &output.stderr,
                output.status.code(),
            )));
        }

        let json: ProbeJson = serde_json::from_slice(&output.stdout).map_err(|e| {
            TubeFetchError::Extraction(format!("unreadable metadata from yt-dlp: {e}"))
        })?;
        Ok(json.into())
    }

    async fn fetch(
        &self,
        url: &str,
        options: &JobOptions,
        output_template: &Path,
    ) -> Result<PathBuf> {
        let output = self.run(&self.fetch_args(url, options, output_template)).await?;
        if !output.status.success() {
            return Err(TubeFetchError::Fetch(failure_reason(
                &output.stderr,
                output.status.code(),
            )));
        }

        printed_path(&output.stdout).ok_or_else(|| {
            TubeFetchError::Fetch("yt-dlp finished without reporting a file".into())
        })
    }
}

/// Map the requested options onto a yt-dlp `-f` selector
pub fn format_selector(options: &JobOptions) -> String {
    match (options.format.is_audio(), options.quality) {
        (true, Quality::Lowest) => "worstaudio/worst".into(),
        (true, _) => "bestaudio/best".into(),
        (false, Quality::Highest) => "bestvideo+bestaudio/best".into(),
        (false, Quality::Lowest) => "worstvideo+worstaudio/worst".into(),
        (false, Quality::MaxHeight(h)) => {
            format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best")
        }
    }
}

/// Last meaningful stderr line, minus yt-dlp's `ERROR: [site] id:` prefix
fn failure_reason(stderr: &[u8], code: Option<i32>) -> String {
    let text = String::from_utf8_lossy(stderr);
    let line = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| text.lines().map(str::trim).rfind(|line| !line.is_empty()));

    match line {
        Some(line) => {
            let stripped = ERROR_PREFIX.replace(line, "");
            if stripped.trim().is_empty() { line.to_string() } else { stripped.trim().to_string() }
        }
        None => format!("yt-dlp exited with code: {:?}", code),
    }
}

/// `--print after_move:filepath` writes the final path as the last stdout line
fn printed_path(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> &'static str {
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
    }

    #[test]
    fn test_format_selector() {
        let audio = JobOptions { format: OutputFormat::Mp3, quality: Quality::Highest };
        assert_eq!(format_selector(&audio), "bestaudio/best");

        let video = JobOptions::default();
        assert_eq!(format_selector(&video), "bestvideo+bestaudio/best");

        let capped = JobOptions { format: OutputFormat::Mp4, quality: Quality::MaxHeight(720) };
        assert_eq!(
            format_selector(&capped),
            "bestvideo[height<=720]+bestaudio/best[height<=720]/best"
        );
    }

    #[test]
    fn test_mp3_fetch_extracts_audio() {
        let ytdlp = YtDlp::default();
        let options = JobOptions { format: OutputFormat::Mp3, quality: Quality::Highest };
        let args = ytdlp.fetch_args(url(), &options, Path::new("/tmp/dl/abc.%(ext)s"));

        assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
        assert!(args.contains(&"-x".to_string()));
        assert!(!args.contains(&"--remux-video".to_string()));
        assert!(args.windows(2).any(|w| w == ["-o", "/tmp/dl/abc.%(ext)s"]));
        assert_eq!(args.last().unwrap(), url());
    }

    #[test]
    fn test_mp4_fetch_remuxes() {
        let ytdlp = YtDlp::default().with_cookies(Some(PathBuf::from("cookies.txt")));
        let args = ytdlp.fetch_args(url(), &JobOptions::default(), Path::new("x.%(ext)s"));

        assert!(args.windows(2).any(|w| w == ["--remux-video", "mp4"]));
        assert!(args.windows(2).any(|w| w == ["--cookies", "cookies.txt"]));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert!(!args.contains(&"-x".to_string()));
        assert!(!args.contains(&"--newline".to_string()));
    }

    #[test]
    fn test_submitted_url_reaches_ytdlp_verbatim() {
        let raw = "HTTPS://YouTube.com/watch?v=Ab";
        let ytdlp = YtDlp::default();

        assert_eq!(ytdlp.probe_args(raw).last().unwrap(), raw);
        let args = ytdlp.fetch_args(raw, &JobOptions::default(), Path::new("x.%(ext)s"));
        assert_eq!(args.last().unwrap(), raw);
    }

    #[test]
    fn test_probe_never_downloads() {
        let args = YtDlp::default().probe_args(url());
        assert_eq!(args[0], "-J");
        assert!(!args.contains(&"-o".to_string()));
    }

    #[test]
    fn test_probe_json_defaults() {
        let json: ProbeJson = serde_json::from_str(r#"{"title":"Song","duration":212.6}"#).unwrap();
        let info = MediaInfo::from(json);
        assert_eq!(info.title, "Song");
        assert_eq!(info.author, "unknown");
        assert_eq!(info.duration_seconds, 213);

        let json: ProbeJson = serde_json::from_str("{}").unwrap();
        assert_eq!(MediaInfo::from(json), MediaInfo::default());
    }

    #[test]
    fn test_failure_reason() {
        let stderr = b"WARNING: something\nERROR: [youtube] dQw4w9WgXcQ: Video unavailable\n";
        assert_eq!(failure_reason(stderr, Some(1)), "Video unavailable");

        let stderr = b"ERROR: Unsupported URL: https://example.com/\n";
        assert_eq!(failure_reason(stderr, Some(1)), "Unsupported URL: https://example.com/");

        assert_eq!(failure_reason(b"", Some(2)), "yt-dlp exited with code: Some(2)");
    }

    #[test]
    fn test_printed_path() {
        let stdout = b"[download] 100%\n/tmp/dl/abc.mp4\n\n";
        assert_eq!(printed_path(stdout), Some(PathBuf::from("/tmp/dl/abc.mp4")));
        assert_eq!(printed_path(b"  \n"), None);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let ytdlp = YtDlp::new("definitely-not-a-real-ytdlp-binary");
        let err = ytdlp.probe(url(), &JobOptions::default()).await.unwrap_err();
        assert!(matches!(err, TubeFetchError::MissingDependency(_)));
    }
}
