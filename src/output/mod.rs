use anyhow::Context;
use console::{style, Term};
use std::path::{Path, PathBuf};

use crate::merge::CanonicalVideoRecord;
use crate::transcribe::FallbackMode;
use crate::utils;
use crate::Result;

const PREVIEW_CHARS: usize = 100;

/// Where each stage's data came from, for the run summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageReport {
    Providers {
        metadata: Option<&'static str>,
        transcripts: Option<&'static str>,
    },
    Local {
        captions: usize,
        transcribed: usize,
        fallback: FallbackMode,
    },
}

/// Pick the export path: explicit flag, else the default name inside the
/// configured output directory.
pub fn resolve_output_path(explicit: Option<PathBuf>, output_dir: Option<&Path>, channel: &str) -> PathBuf {
    explicit.unwrap_or_else(|| {
        let name = utils::default_output_filename(channel);
        match output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    })
}

/// Write the records as a pretty-printed JSON array
pub fn save_records(records: &[CanonicalVideoRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
    fs_err::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Print the end-of-run summary
pub fn print_summary(records: &[CanonicalVideoRecord], report: &StageReport, path: &Path, elapsed_secs: f64) {
    let with_transcript = records.iter().filter(|r| r.has_transcript()).count();

    println!("{}", style("─".repeat(60)).dim());
    println!("{} {}", style("Total shorts:").bold(), records.len());
    println!("{} {}", style("With transcript:").bold(), with_transcript);

    match report {
        StageReport::Providers { metadata, transcripts } => {
            println!("{} {}", style("Metadata provider:").dim(), metadata.unwrap_or("none"));
            println!("{} {}", style("Transcript provider:").dim(), transcripts.unwrap_or("none"));
        }
        StageReport::Local {
            captions,
            transcribed,
            fallback,
        } => {
            println!("{} {}", style("From captions:").dim(), captions);
            println!(
                "{} {} ({})",
                style("From whisper:").dim(),
                transcribed,
                fallback.as_str()
            );
        }
    }

    if let Some(first) = records.first() {
        println!("{}", style("Sample:").bold());
        println!("  title: {}", first.title);
        println!("  url: {}", first.video_url.as_deref().unwrap_or("N/A"));
        println!("  transcript: {}", transcript_preview(&first.transcript));
    }

    println!(
        "{} {} {}",
        style("Saved:").dim(),
        style(path.display()).cyan(),
        style(format!("in {}", utils::format_duration(elapsed_secs))).dim()
    );
}

/// First characters of a transcript, with an ellipsis when cut
pub fn transcript_preview(text: &str) -> String {
    let mut chars = text.chars();
    let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Ask for a value on the terminal; an empty answer is an error
pub fn prompt(label: &str) -> Result<String> {
    let term = Term::stderr();
    term.write_str(&format!("{}: ", label))?;
    let answer = term.read_line()?;
    let answer = answer.trim();

    if answer.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(answer.to_string())
}
