//! tubefetch - hand a media URL to yt-dlp, poll, download the result
//!
//! A small HTTP service around yt-dlp with background jobs.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tubefetch::core::ytdlp::YtDlp;
use tubefetch::server::{self, AppState};
use tubefetch::storage::config::{load_config, save_config};
use tubefetch::storage::downloads::DownloadDir;
use tubefetch::types::Config;
use tubefetch::utils::paths::get_config_path;

/// Media download service backed by yt-dlp
#[derive(Parser, Debug)]
#[command(name = "tubefetch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON config file (defaults to the XDG config location)
    #[arg(short, long, env = "TUBEFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Directory finished downloads are written to
    #[arg(short, long, env = "DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Directory served under /static
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// yt-dlp executable
    #[arg(long, env = "YTDLP_PATH")]
    ytdlp_path: Option<String>,

    /// Cookie jar passed to yt-dlp
    #[arg(long, env = "YTDLP_COOKIES")]
    cookies: Option<PathBuf>,

    /// Maximum simultaneous background downloads
    #[arg(long, env = "MAX_CONCURRENT_DOWNLOADS")]
    max_concurrent: Option<usize>,

    /// Seconds a finished job stays in the job table
    #[arg(long, env = "JOB_RETENTION_SECS")]
    job_retention_secs: Option<u64>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Command line and environment take precedence over the file
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = self.download_dir {
            config.download_dir = dir;
        }
        if self.static_dir.is_some() {
            config.static_dir = self.static_dir;
        }
        if let Some(path) = self.ytdlp_path {
            config.ytdlp_path = path;
        }
        if self.cookies.is_some() {
            config.cookies_file = self.cookies;
        }
        if let Some(max) = self.max_concurrent {
            config.max_concurrent_downloads = max;
        }
        if let Some(secs) = self.job_retention_secs {
            config.job_retention_secs = secs;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(get_config_path);
    let save = cli.save_config;

    let config = cli.apply(load_config(&config_path).await?);
    config.validate()?;

    if save {
        save_config(&config_path, &config).await?;
        println!("Saved configuration to {}", config_path.display());
        return Ok(());
    }

    DownloadDir::new(config.download_dir.clone()).ensure().await?;
    if let Some(ref cookies) = config.cookies_file {
        if !cookies.exists() {
            warn!(path = %cookies.display(), "cookie file not found, yt-dlp may fail");
        }
    }

    info!(
        download_dir = %config.download_dir.display(),
        max_concurrent = config.max_concurrent_downloads,
        "starting tubefetch"
    );

    let extractor = YtDlp::new(config.ytdlp_path.clone()).with_cookies(config.cookies_file.clone());
    let state = AppState::new(config, Arc::new(extractor));
    server::serve(state).await
}
