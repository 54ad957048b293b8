use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{:.1}s", seconds);
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}

/// Sanitize filename for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            match c {
                // Keep alphanumeric characters, hyphens, underscores, and dots
                c if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
                _ => '_',
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// The `@handle` part of a channel input, if it has one
pub fn channel_handle(channel: &str) -> Option<String> {
    let (_, tail) = channel.trim().trim_end_matches('/').rsplit_once('@')?;
    let handle = tail.split(['/', '?', '#']).next().unwrap_or_default();
    if handle.is_empty() {
        None
    } else {
        Some(handle.to_string())
    }
}

/// Default export name: `<handle>_shorts_data.json`
pub fn default_output_filename(channel: &str) -> String {
    let handle = channel_handle(channel)
        .map(|h| sanitize_filename(&h))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "channel".to_string());
    format!("{}_shorts_data.json", handle)
}

/// Progress bar for a sequential per-item phase; hidden when not wanted
pub fn item_progress(len: u64, message: &'static str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.set_message(message);
    progress
}

/// Fixed pacing delay between per-item requests
pub async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Check the tools needed beyond yt-dlp, which is probed on its own
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    // ffmpeg is needed to extract mp3 audio for the speech fallback
    if !check_command_available("ffmpeg").await {
        missing.push("ffmpeg - required for the speech-to-text fallback".to_string());
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
