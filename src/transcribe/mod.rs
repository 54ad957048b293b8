use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

pub mod whisper;

use crate::extractors::{AudioFetcher, CaptionSource};
use crate::merge::TranscriptMap;
use crate::utils;
use crate::Result;

pub use whisper::WhisperCli;

/// Local speech-to-text engine
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file to plain text
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

/// Whether the speech-to-text fallback runs, decided once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackMode {
    Enabled,
    /// Turned off by the user
    Disabled,
    /// Requested but the engine is not installed
    Unavailable,
}

impl FallbackMode {
    pub fn resolve(engine_available: bool, enabled: bool) -> Self {
        match (enabled, engine_available) {
            (false, _) => FallbackMode::Disabled,
            (true, false) => FallbackMode::Unavailable,
            (true, true) => FallbackMode::Enabled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackMode::Enabled => "whisper enabled",
            FallbackMode::Disabled => "whisper disabled",
            FallbackMode::Unavailable => "whisper not installed",
        }
    }
}

/// Acquisition state of one video's transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptState {
    Pending,
    CaptionFound(String),
    /// Terminal when the fallback does not run
    CaptionMissing,
    AudioAcquired(PathBuf),
    Transcribed(String),
    TranscribeFailed,
    AudioAcquisitionFailed,
}

impl TranscriptState {
    /// Transcript text of a successful terminal state
    pub fn transcript(&self) -> Option<&str> {
        match self {
            TranscriptState::CaptionFound(text) | TranscriptState::Transcribed(text) => Some(text),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TranscriptState::Pending => "pending",
            TranscriptState::CaptionFound(_) => "caption-found",
            TranscriptState::CaptionMissing => "caption-missing",
            TranscriptState::AudioAcquired(_) => "audio-acquired",
            TranscriptState::Transcribed(_) => "transcribed",
            TranscriptState::TranscribeFailed => "transcribe-failed",
            TranscriptState::AudioAcquisitionFailed => "audio-acquisition-failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTranscript {
    pub video_id: String,
    pub state: TranscriptState,
}

/// Final states of a pipeline run, in input order.
#[derive(Debug, Clone)]
pub struct TranscriptOutcome {
    pub entries: Vec<VideoTranscript>,
    pub mode: FallbackMode,
}

impl TranscriptOutcome {
    pub fn state(&self, video_id: &str) -> Option<&TranscriptState> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.video_id == video_id)
            .map(|entry| &entry.state)
    }

    pub fn count(&self, predicate: impl Fn(&TranscriptState) -> bool) -> usize {
        self.entries.iter().filter(|entry| predicate(&entry.state)).count()
    }

    pub fn caption_count(&self) -> usize {
        self.count(|s| matches!(s, TranscriptState::CaptionFound(_)))
    }

    pub fn transcribed_count(&self) -> usize {
        self.count(|s| matches!(s, TranscriptState::Transcribed(_)))
    }

    /// Successful transcripts keyed by video id
    pub fn to_map(&self) -> TranscriptMap {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry
                    .state
                    .transcript()
                    .map(|text| (entry.video_id.clone(), text.to_string()))
            })
            .collect()
    }
}

/// Components of the speech-to-text fallback
#[derive(Clone, Copy)]
pub struct SpeechFallback<'a> {
    pub audio: &'a dyn AudioFetcher,
    pub engine: &'a dyn SpeechToText,
}

/// Removes a downloaded audio file when dropped.
struct AudioArtifact(PathBuf);

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if let Err(e) = fs_err::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Could not remove audio artifact: {}", e);
            }
        }
    }
}

/// Two-phase transcript acquisition.
///
/// Phase one looks up platform captions for every video. Phase two runs only
/// for videos still missing a transcript, and only when the fallback is
/// enabled: download audio, transcribe locally, delete the audio.
pub struct CaptionThenSpeech<'a> {
    captions: &'a dyn CaptionSource,
    fallback: Option<SpeechFallback<'a>>,
    mode: FallbackMode,
    caption_delay: Duration,
    audio_delay: Duration,
    temp_root: Option<PathBuf>,
    show_progress: bool,
}

impl<'a> CaptionThenSpeech<'a> {
    pub fn new(captions: &'a dyn CaptionSource) -> Self {
        Self {
            captions,
            fallback: None,
            mode: FallbackMode::Disabled,
            caption_delay: Duration::ZERO,
            audio_delay: Duration::ZERO,
            temp_root: None,
            show_progress: false,
        }
    }

    /// Attach the fallback. It only runs when `mode` is [`FallbackMode::Enabled`].
    pub fn with_fallback(mut self, fallback: SpeechFallback<'a>, mode: FallbackMode) -> Self {
        self.fallback = Some(fallback);
        self.mode = mode;
        self
    }

    /// Record a fallback that cannot run, so the outcome reports why
    pub fn without_fallback(mut self, mode: FallbackMode) -> Self {
        self.fallback = None;
        self.mode = if mode == FallbackMode::Enabled { FallbackMode::Unavailable } else { mode };
        self
    }

    pub fn with_pacing(mut self, caption_delay: Duration, audio_delay: Duration) -> Self {
        self.caption_delay = caption_delay;
        self.audio_delay = audio_delay;
        self
    }

    /// Directory under which the audio working area is created
    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp_root = root;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub async fn run(&self, video_ids: &[String]) -> TranscriptOutcome {
        tracing::info!("Collecting transcripts for {} videos", video_ids.len());

        let mut entries: Vec<VideoTranscript> = video_ids
            .iter()
            .map(|id| VideoTranscript {
                video_id: id.clone(),
                state: TranscriptState::Pending,
            })
            .collect();

        self.caption_phase(&mut entries).await;

        let missing: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.state == TranscriptState::CaptionMissing)
            .map(|(index, _)| index)
            .collect();

        tracing::info!(
            "Captions found: {}/{}",
            entries.len() - missing.len(),
            entries.len()
        );

        match (self.mode, self.fallback) {
            _ if missing.is_empty() => {}
            (FallbackMode::Enabled, Some(fallback)) => {
                self.speech_phase(fallback, &mut entries, &missing).await;
            }
            (FallbackMode::Disabled, _) => {
                tracing::info!("{} videos have no captions; speech fallback disabled", missing.len());
            }
            _ => {
                tracing::warn!(
                    "{} videos have no captions; speech-to-text engine not installed",
                    missing.len()
                );
            }
        }

        TranscriptOutcome {
            entries,
            mode: self.mode,
        }
    }

    async fn caption_phase(&self, entries: &mut [VideoTranscript]) {
        let progress = utils::item_progress(entries.len() as u64, "Fetching captions", self.show_progress);

        for (index, entry) in entries.iter_mut().enumerate() {
            if index > 0 {
                utils::pause(self.caption_delay).await;
            }

            entry.state = match self.captions.fetch_captions(&entry.video_id).await {
                Ok(Some(text)) if !text.trim().is_empty() => TranscriptState::CaptionFound(text),
                Ok(_) => TranscriptState::CaptionMissing,
                Err(e) => {
                    tracing::debug!("No captions for {}: {:#}", entry.video_id, e);
                    TranscriptState::CaptionMissing
                }
            };
            progress.inc(1);
        }

        progress.finish_and_clear();
    }

    async fn speech_phase(&self, fallback: SpeechFallback<'_>, entries: &mut [VideoTranscript], missing: &[usize]) {
        tracing::info!("Speech fallback for {} videos without captions", missing.len());

        let work_area = match self.work_area() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!("Could not create audio working area: {:#}", e);
                for &index in missing {
                    entries[index].state = TranscriptState::AudioAcquisitionFailed;
                }
                return;
            }
        };

        let progress = utils::item_progress(missing.len() as u64, "Transcribing audio", self.show_progress);

        for (position, &index) in missing.iter().enumerate() {
            if position > 0 {
                utils::pause(self.audio_delay).await;
            }

            let entry = &mut entries[index];
            entry.state = self.transcribe_one(fallback, &entry.video_id, work_area.path()).await;
            tracing::debug!("{} -> {}", entry.video_id, entry.state.label());
            progress.inc(1);
        }

        progress.finish_and_clear();

        let transcribed = missing
            .iter()
            .filter(|&&index| matches!(entries[index].state, TranscriptState::Transcribed(_)))
            .count();
        tracing::info!("Speech transcribed: {}/{}", transcribed, missing.len());
    }

    async fn transcribe_one(&self, fallback: SpeechFallback<'_>, video_id: &str, dir: &Path) -> TranscriptState {
        let artifact = match fallback.audio.fetch_audio(video_id, dir).await {
            Ok(path) => AudioArtifact(path),
            Err(e) => {
                tracing::warn!("Audio download failed for {}: {:#}", video_id, e);
                return TranscriptState::AudioAcquisitionFailed;
            }
        };

        let acquired = TranscriptState::AudioAcquired(artifact.0.clone());
        tracing::debug!("{} -> {}", video_id, acquired.label());

        match fallback.engine.transcribe(&artifact.0).await {
            Ok(text) if !text.trim().is_empty() => TranscriptState::Transcribed(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!("Transcription of {} produced no text", video_id);
                TranscriptState::TranscribeFailed
            }
            Err(e) => {
                tracing::warn!("Transcription failed for {}: {:#}", video_id, e);
                TranscriptState::TranscribeFailed
            }
        }
    }

    fn work_area(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shorts-audio-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}
