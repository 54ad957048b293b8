//! Shorts Collector - gathers metadata and transcripts for a channel's shorts
//!
//! Metadata and transcripts come from interchangeable, unreliable extraction
//! providers tried in a fixed order. The records they return are normalized
//! and merged into one canonical list. A free edition lists the channel with
//! yt-dlp and falls back from captions to local speech-to-text.

pub mod cli;
pub mod collect;
pub mod config;
pub mod extractors;
pub mod merge;
pub mod output;
pub mod providers;
pub mod record;
pub mod transcribe;
pub mod utils;

use std::path::PathBuf;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use merge::{merge_records, CanonicalVideoRecord, TranscriptMap};
pub use providers::{FallbackResult, ProviderBackend, ProviderDescriptor, ProviderRunner};
pub use record::RawRecord;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the collector
#[derive(thiserror::Error, Debug)]
pub enum CollectorError {
    #[error("No metadata could be retrieved for {channel}: every provider failed")]
    NoMetadata { channel: String },

    #[error("No shorts found for {channel}")]
    NoShortsFound { channel: String },

    #[error("No Apify API key provided (use --api-key, APIFY_API_KEY or the config file)")]
    MissingApiKey,

    #[error("{tool} is not available on PATH")]
    ToolUnavailable { tool: String },

    #[error("Provider {provider} finished with status {status}")]
    ProviderRun { provider: String, status: String },

    #[error("Audio download failed for {video_id}: {reason}")]
    AudioAcquisition { video_id: String, reason: String },

    #[error("Transcription failed for {audio_path}: {reason}")]
    Transcription { audio_path: PathBuf, reason: String },

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),
}
