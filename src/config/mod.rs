use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hosted actor platform settings
    pub apify: ApifyConfig,

    /// yt-dlp settings for the free edition
    pub youtube: YoutubeConfig,

    /// Local speech-to-text fallback
    pub whisper: WhisperConfig,

    /// Delays inserted between sequential per-item requests
    pub pacing: PacingConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApifyConfig {
    /// API token (overridden by `--api-key` / `APIFY_API_KEY`)
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Maximum time to wait for a single actor run
    pub run_timeout_secs: u64,

    /// Base interval between run status checks
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// Browser to read cookies from
    pub cookies_from_browser: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// Use the fallback for videos without captions
    pub enabled: bool,

    /// whisper executable
    pub binary: String,

    /// Model size: tiny, base, small, medium, large
    pub model: String,

    /// Spoken language (auto-detect if not specified)
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub metadata_delay_ms: u64,
    pub caption_delay_ms: u64,
    pub audio_delay_ms: u64,
    pub provider_item_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Temporary directory for downloaded audio
    pub temp_dir: Option<PathBuf>,

    /// Directory for exported files
    pub output_dir: Option<PathBuf>,
}

impl Default for ApifyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.apify.com".to_string(),
            run_timeout_secs: 900,
            poll_interval_secs: 5,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            cookies_from_browser: None,
        }
    }
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: "whisper".to_string(),
            model: "base".to_string(),
            language: None,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            metadata_delay_ms: 500,
            caption_delay_ms: 300,
            audio_delay_ms: 300,
            provider_item_delay_ms: 0,
        }
    }
}

impl PacingConfig {
    pub fn metadata_delay(&self) -> Duration {
        Duration::from_millis(self.metadata_delay_ms)
    }

    pub fn caption_delay(&self) -> Duration {
        Duration::from_millis(self.caption_delay_ms)
    }

    pub fn audio_delay(&self) -> Duration {
        Duration::from_millis(self.audio_delay_ms)
    }

    pub fn provider_item_delay(&self) -> Duration {
        Duration::from_millis(self.provider_item_delay_ms)
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config = Self::from_yaml(&content)?;
            tracing::debug!("Loaded configuration from {}", config_path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("shorts-collector").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.apify.base_url)
            .with_context(|| format!("Invalid apify.base_url: {}", self.apify.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            anyhow::bail!("apify.base_url must use HTTP or HTTPS protocol");
        }

        if self.whisper.model.trim().is_empty() {
            anyhow::bail!("whisper.model must not be empty");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Apify Base URL: {}", self.apify.base_url);
        println!(
            "  Apify API Key: {}",
            if self.apify.api_key.is_some() { "configured" } else { "not set" }
        );
        println!("  Run Timeout: {}s", self.apify.run_timeout_secs);
        println!("  yt-dlp: {}", self.youtube.yt_dlp_path);
        if let Some(browser) = &self.youtube.cookies_from_browser {
            println!("  Cookies From: {}", browser);
        }
        println!(
            "  Whisper Fallback: {} ({} model)",
            if self.whisper.enabled { "enabled" } else { "disabled" },
            self.whisper.model
        );
        println!(
            "  Pacing: metadata {}ms, captions {}ms, audio {}ms",
            self.pacing.metadata_delay_ms, self.pacing.caption_delay_ms, self.pacing.audio_delay_ms
        );
        if let Some(dir) = &self.app.output_dir {
            println!("  Output Directory: {}", dir.display());
        }
    }

    /// Point the user at the config file
    pub async fn interactive_setup(&self) -> Result<()> {
        println!("Edit the config file to change settings:");
        println!("  {}", Self::config_path()?.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("whisper:\n  model: small\n").unwrap();
        assert_eq!(config.whisper.model, "small");
        assert!(config.whisper.enabled);
        assert_eq!(config.apify.base_url, "https://api.apify.com");
        assert_eq!(config.pacing.metadata_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(Config::from_yaml("apify:\n  base_url: not a url\n").is_err());
        assert!(Config::from_yaml("apify:\n  base_url: ftp://example.com\n").is_err());
    }

    #[test]
    fn test_empty_model_is_rejected() {
        assert!(Config::from_yaml("whisper:\n  model: ''\n").is_err());
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.youtube.yt_dlp_path, "yt-dlp");
    }
}
