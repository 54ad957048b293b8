use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

pub mod captions;
pub mod youtube;

use crate::record::RawRecord;
use crate::{CollectorError, Result};

/// Channel listing and per-video metadata lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Ids of every short on the channel, in listing order
    async fn list_shorts(&self, channel_url: &str) -> Result<Vec<String>>;

    /// Raw metadata record for one video
    async fn video_metadata(&self, video_id: &str) -> Result<RawRecord>;
}

/// Platform caption lookup, no media download involved
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Caption text for a video, `None` when it has no captions
    async fn fetch_captions(&self, video_id: &str) -> Result<Option<String>>;
}

/// Downloads a video's audio track for local transcription
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    /// Download audio into `dir` and return the file path
    async fn fetch_audio(&self, video_id: &str, dir: &Path) -> Result<PathBuf>;
}

/// Channel page tabs that may trail a channel URL
const CHANNEL_TABS: &[&str] = &["videos", "featured", "streams", "playlists", "community", "about", "shorts"];

/// Turn a channel handle or URL into the URL of the channel's shorts tab.
pub fn channel_shorts_url(input: &str) -> Result<String> {
    let input = input.trim();

    if input.is_empty() {
        return Err(CollectorError::InvalidChannel("empty channel".to_string()).into());
    }

    let input = if input.starts_with('@') {
        format!("https://www.youtube.com/{}", input)
    } else {
        input.to_string()
    };

    let mut parsed = validate_url(&input)?;
    let path = shorts_tab_path(parsed.path());
    parsed.set_path(&path);

    Ok(parsed.to_string())
}

/// Point a channel path at its shorts tab, replacing any other tab.
fn shorts_tab_path(path: &str) -> String {
    let path = path.trim_end_matches('/');
    match path.rsplit_once('/') {
        Some((channel, tab)) if CHANNEL_TABS.contains(&tab) => format!("{}/shorts", channel),
        _ => format!("{}/shorts", path),
    }
}

/// Validate and normalize URLs
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|_| CollectorError::InvalidChannel(format!("invalid URL format: {}", url)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CollectorError::InvalidChannel("URL must use HTTP or HTTPS protocol".to_string()).into());
    }

    Ok(parsed)
}
