use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::{FallbackMode, SpeechToText};
use crate::config::WhisperConfig;
use crate::{CollectorError, Result};

/// Speech-to-text through the `whisper` command line tool
pub struct WhisperCli {
    binary: String,
    model: String,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    text: String,
}

impl WhisperCli {
    pub fn from_config(config: &WhisperConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Probe whether the engine can be launched at all
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--help")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Decide the fallback capability; the engine is only probed when enabled
    pub async fn fallback_mode(&self, enabled: bool) -> FallbackMode {
        let available = enabled && self.is_available().await;
        FallbackMode::resolve(available, enabled)
    }
}

#[async_trait]
impl SpeechToText for WhisperCli {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let output_dir = audio_path.parent().unwrap_or(Path::new("."));

        let mut command = Command::new(&self.binary);
        command
            .arg(audio_path)
            .args(["--model", self.model.as_str()])
            .args(["--output_format", "json"])
            .args(["--verbose", "False"])
            .arg("--output_dir")
            .arg(output_dir);
        if let Some(language) = &self.language {
            command.args(["--language", language.as_str()]);
        }

        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(CollectorError::Transcription {
                audio_path: audio_path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        // whisper names its output after the input file
        let stem = audio_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let json_path = output_dir.join(format!("{}.json", stem));

        let content = fs_err::read_to_string(&json_path)?;
        let _ = fs_err::remove_file(&json_path);

        parse_whisper_output(&content)
    }
}

fn parse_whisper_output(content: &str) -> Result<String> {
    let output: WhisperOutput = serde_json::from_str(content)?;
    Ok(output.text.trim().to_string())
}
