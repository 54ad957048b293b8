//! Raw provider records and the field-name tables used to read them.
//!
//! Providers return loosely shaped JSON objects. Nothing here assumes a fixed
//! schema: every canonical attribute is read from an ordered list of candidate
//! field names, first present value wins.

use serde_json::{Map, Value};

pub mod identifier;
pub mod normalize;

pub use identifier::{extract_video_id, short_url};
pub use normalize::{coerce_count, normalize_release_date, transcript_text, Metric};

/// An opaque record as returned by a provider.
pub type RawRecord = Map<String, Value>;

/// Placeholder for any field that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// Candidate field names per canonical attribute, in priority order.
pub mod fields {
    pub const ID: &[&str] = &["id", "videoId"];
    pub const URL: &[&str] = &["url", "videoUrl"];
    pub const TITLE: &[&str] = &["title", "name"];
    pub const VIEWS: &[&str] = &["viewCount", "views", "view_count"];
    pub const LIKES: &[&str] = &["likeCount", "likes", "like_count"];
    pub const RELEASE_DATE: &[&str] = &["uploadDate", "date", "publishedAt", "upload_date"];
    pub const TRANSCRIPT: &[&str] = &[
        "transcript",
        "text",
        "captions",
        "transcription",
        "content",
        "subtitles",
    ];
}

/// Whether a value counts as present: not null, not a blank string and not an
/// empty container. Numeric zero is present.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// First present value among `candidates`, tried in order.
pub fn first_present<'a>(record: &'a RawRecord, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|name| record.get(*name))
        .find(|value| is_present(value))
}

/// Like [`first_present`] but only accepts values usable as text.
pub fn first_text(record: &RawRecord, candidates: &[&str]) -> Option<String> {
    first_present(record, candidates).and_then(scalar_text)
}

/// Render a scalar as text. Containers have no scalar rendering.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalized transcript text carried by a record, if any.
///
/// Reads the first present transcript-bearing field and coerces it to plain
/// text. Blank text and the sentinel count as no transcript.
pub fn record_transcript(record: &RawRecord) -> Option<String> {
    let text = transcript_text(first_present(record, fields::TRANSCRIPT)?);
    let text = text.trim();
    if text.is_empty() || text == NOT_AVAILABLE {
        None
    } else {
        Some(text.to_string())
    }
}
