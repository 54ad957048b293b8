//! Provider lists for the hosted-actor edition.
//!
//! Order is significant: the runner tries entries top to bottom and stops at
//! the first one whose output passes its predicate.

use serde_json::{json, Value};

use super::{InvocationMode, ProviderDescriptor};
use crate::record::{record_transcript, RawRecord};

/// Upper bound requested from metadata actors for a single channel.
pub const MAX_SHORTS_PER_RUN: u32 = 1000;

pub const METADATA_PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        name: "streamers/youtube-scraper",
        build_request: start_urls_max_results,
        mode: InvocationMode::Batch,
        success: has_records,
    },
    ProviderDescriptor {
        name: "apidojo/youtube-scraper",
        build_request: start_urls_shorts_only,
        mode: InvocationMode::Batch,
        success: has_records,
    },
    ProviderDescriptor {
        name: "clockworks/youtube-channel-scraper",
        build_request: start_urls_max_results,
        mode: InvocationMode::Batch,
        success: has_records,
    },
];

pub const TRANSCRIPT_PROVIDERS: &[ProviderDescriptor] = &[
    transcript("tictechid/anoxvanzi-Transcriber", snake_start_urls, InvocationMode::Batch),
    transcript("stanvanrooy6/youtube-transcriber-gpt4o", url_list, InvocationMode::Batch),
    transcript("vittuhy/audio-and-video-transcript", url_list, InvocationMode::Batch),
    transcript("practicaltools/apify-youtube-transcribe", single_video_url, InvocationMode::PerItem),
    transcript("aizen0/video-to-text-transcription", url_list, InvocationMode::Batch),
    transcript("cheapget/video-to-text", single_video_url_snake, InvocationMode::PerItem),
    transcript("crawlmaster/youtube-transcript-fetcher", start_urls, InvocationMode::Batch),
    transcript("starvibe/youtube-video-transcript", video_url_list, InvocationMode::Batch),
    transcript("karamelo/youtube-transcripts", url_list, InvocationMode::Batch),
    transcript("dz_omar/youtube-transcript-metadata-extractor", start_urls, InvocationMode::Batch),
    transcript("scrapestorm/Youtube-transcript-Videos", start_urls, InvocationMode::Batch),
];

const fn transcript(
    name: &'static str,
    build_request: fn(&[String]) -> Value,
    mode: InvocationMode,
) -> ProviderDescriptor {
    ProviderDescriptor {
        name,
        build_request,
        mode,
        success: has_transcript,
    }
}

/// Metadata predicate: any record at all.
pub fn has_records(records: &[RawRecord]) -> bool {
    !records.is_empty()
}

/// Transcript predicate: at least one record carries real transcript text.
///
/// Placeholder values (blank strings, empty segment lists, the sentinel) do
/// not count.
pub fn has_transcript(records: &[RawRecord]) -> bool {
    records.iter().any(|record| record_transcript(record).is_some())
}

fn url_objects(inputs: &[String]) -> Vec<Value> {
    inputs.iter().map(|url| json!({ "url": url })).collect()
}

fn first_input(inputs: &[String]) -> &str {
    inputs.first().map(String::as_str).unwrap_or_default()
}

fn start_urls_max_results(inputs: &[String]) -> Value {
    json!({
        "startUrls": url_objects(inputs),
        "maxResults": MAX_SHORTS_PER_RUN,
    })
}

fn start_urls_shorts_only(inputs: &[String]) -> Value {
    json!({
        "startUrls": url_objects(inputs),
        "maxResultsShorts": MAX_SHORTS_PER_RUN,
        "scrapeShorts": true,
    })
}

fn start_urls(inputs: &[String]) -> Value {
    json!({ "startUrls": url_objects(inputs) })
}

fn snake_start_urls(inputs: &[String]) -> Value {
    json!({ "start_urls": url_objects(inputs) })
}

fn url_list(inputs: &[String]) -> Value {
    json!({ "urls": inputs })
}

fn video_url_list(inputs: &[String]) -> Value {
    json!({ "videoUrls": inputs })
}

fn single_video_url(inputs: &[String]) -> Value {
    json!({ "videoUrl": first_input(inputs) })
}

fn single_video_url_snake(inputs: &[String]) -> Value {
    json!({ "video_url": first_input(inputs) })
}
