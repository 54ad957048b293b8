use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{captions, AudioFetcher, CaptionSource, ChannelSource};
use crate::config::YoutubeConfig;
use crate::record::{short_url, RawRecord};
use crate::{CollectorError, Result};

/// YouTube access through yt-dlp
pub struct YoutubeExtractor {
    yt_dlp_path: String,
    cookies_from_browser: Option<String>,
}

impl YoutubeExtractor {
    pub fn from_config(config: &YoutubeConfig) -> Self {
        Self {
            yt_dlp_path: config.yt_dlp_path.clone(),
            cookies_from_browser: config.cookies_from_browser.clone(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        let output = Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        matches!(output, Ok(out) if out.status.success())
    }

    /// Fail early with a clear message when yt-dlp is missing
    pub async fn ensure_available(&self) -> Result<()> {
        if self.check_availability().await {
            Ok(())
        } else {
            Err(CollectorError::ToolUnavailable {
                tool: format!("{} (install it: https://github.com/yt-dlp/yt-dlp)", self.yt_dlp_path),
            }
            .into())
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.yt_dlp_path);
        command.args(["--no-warnings", "--no-playlist"]);
        if let Some(browser) = &self.cookies_from_browser {
            command.args(["--cookies-from-browser", browser.as_str()]);
        }
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        command
    }

    async fn run(&self, mut command: Command, what: &str) -> Result<Vec<u8>> {
        let output = command.output().await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed to {}: {}", what, error.trim());
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl ChannelSource for YoutubeExtractor {
    async fn list_shorts(&self, channel_url: &str) -> Result<Vec<String>> {
        tracing::debug!("Listing shorts for: {}", channel_url);

        let mut command = Command::new(&self.yt_dlp_path);
        command.args(["--no-warnings", "--flat-playlist", "--print", "id"]);
        if let Some(browser) = &self.cookies_from_browser {
            command.args(["--cookies-from-browser", browser.as_str()]);
        }
        command.arg(channel_url).stdout(Stdio::piped()).stderr(Stdio::piped());

        let stdout = self.run(command, "list channel shorts").await?;
        Ok(parse_id_listing(&String::from_utf8_lossy(&stdout)))
    }

    async fn video_metadata(&self, video_id: &str) -> Result<RawRecord> {
        tracing::debug!("Extracting video info for: {}", video_id);

        let mut command = self.command();
        command.args(["--dump-json", "--skip-download"]).arg(short_url(video_id));

        let stdout = self.run(command, "extract video info").await?;
        let info: Value = serde_json::from_slice(&stdout)?;
        Ok(metadata_record(video_id, &info))
    }
}

#[async_trait]
impl CaptionSource for YoutubeExtractor {
    async fn fetch_captions(&self, video_id: &str) -> Result<Option<String>> {
        let dir = tempfile::tempdir()?;
        let template = dir.path().join("%(id)s.%(ext)s");

        let mut command = self.command();
        command
            .args([
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--sub-langs", "en.*,en",
                "--sub-format", "json3",
                "--output",
            ])
            .arg(&template)
            .arg(short_url(video_id));

        self.run(command, "fetch captions").await?;

        match captions::find_subtitle_file(dir.path())? {
            Some(path) => captions::parse_json3(&fs_err::read_to_string(&path)?),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AudioFetcher for YoutubeExtractor {
    async fn fetch_audio(&self, video_id: &str, dir: &Path) -> Result<PathBuf> {
        tracing::debug!("Downloading audio for: {}", video_id);

        let template = dir.join(format!("{}.%(ext)s", video_id));
        let mut command = self.command();
        command
            .args([
                "--format", "bestaudio/best",
                "--extract-audio",
                "--audio-format", "mp3",
                "--audio-quality", "96K",
                "--output",
            ])
            .arg(&template)
            .arg(short_url(video_id));

        if let Err(e) = self.run(command, "download audio").await {
            return Err(CollectorError::AudioAcquisition {
                video_id: video_id.to_string(),
                reason: format!("{:#}", e),
            }
            .into());
        }

        let audio_path = dir.join(format!("{}.mp3", video_id));
        if !audio_path.exists() {
            return Err(CollectorError::AudioAcquisition {
                video_id: video_id.to_string(),
                reason: format!("{} was not produced", audio_path.display()),
            }
            .into());
        }

        Ok(audio_path)
    }
}

fn parse_id_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != "NA")
        .map(str::to_string)
        .collect()
}

/// Map yt-dlp's info JSON onto a raw record readable by the merger.
fn metadata_record(video_id: &str, info: &Value) -> RawRecord {
    let record = json!({
        "id": video_id,
        "title": info["title"],
        "view_count": info["view_count"],
        "like_count": info["like_count"],
        "upload_date": info["upload_date"],
        "url": short_url(video_id),
    });

    match record {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}
