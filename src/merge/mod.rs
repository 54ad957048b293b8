//! Joins metadata records with transcripts into the canonical schema.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::{
    coerce_count, extract_video_id, fields, first_present, first_text, normalize_release_date,
    record_transcript, short_url, Metric, RawRecord, NOT_AVAILABLE,
};

/// Transcript text keyed by video id. A later insert for the same id wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptMap {
    entries: HashMap<String, String>,
}

impl TranscriptMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from transcript-stage provider records. Records without
    /// an id or without usable text are skipped.
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut map = Self::new();
        for record in records {
            if let (Some(id), Some(text)) = (extract_video_id(record), record_transcript(record)) {
                map.insert(id, text);
            }
        }
        map
    }

    pub fn insert(&mut self, video_id: impl Into<String>, text: impl Into<String>) {
        let text = text.into();
        if !text.trim().is_empty() {
            self.entries.insert(video_id.into(), text);
        }
    }

    pub fn get(&self, video_id: &str) -> Option<&str> {
        self.entries.get(video_id).map(String::as_str)
    }

    /// Transcript for an optional id, or the sentinel
    pub fn transcript_or_sentinel(&self, video_id: Option<&str>) -> String {
        video_id
            .and_then(|id| self.get(id))
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for TranscriptMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, text) in iter {
            map.insert(id, text);
        }
        map
    }
}

/// One short in the exported schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalVideoRecord {
    pub title: String,
    pub views: Option<Metric>,
    pub likes: Option<Metric>,
    pub release_date: String,
    pub video_url: Option<String>,
    pub video_id: Option<String>,
    pub transcript: String,
}

impl CanonicalVideoRecord {
    pub fn has_transcript(&self) -> bool {
        self.transcript != NOT_AVAILABLE && !self.transcript.is_empty()
    }
}

/// Build one canonical record per metadata record, in order.
///
/// Nothing is dropped or deduplicated: unresolved fields degrade to `None`
/// or the sentinel.
pub fn merge_records(metadata: &[RawRecord], transcripts: &TranscriptMap) -> Vec<CanonicalVideoRecord> {
    tracing::info!(
        "Merging {} records with {} transcripts",
        metadata.len(),
        transcripts.len()
    );

    metadata
        .iter()
        .map(|record| canonical_record(record, transcripts))
        .collect()
}

pub fn canonical_record(record: &RawRecord, transcripts: &TranscriptMap) -> CanonicalVideoRecord {
    let video_id = extract_video_id(record);

    let video_url = first_text(record, fields::URL)
        .or_else(|| video_id.as_deref().map(short_url));

    CanonicalVideoRecord {
        title: first_text(record, fields::TITLE).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        views: first_present(record, fields::VIEWS).and_then(coerce_count),
        likes: first_present(record, fields::LIKES).and_then(coerce_count),
        release_date: normalize_release_date(first_present(record, fields::RELEASE_DATE)),
        video_url,
        transcript: transcripts.transcript_or_sentinel(video_id.as_deref()),
        video_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn rec(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_transcript_map_from_records() {
        let records = vec![
            rec(json!({"url": "https://www.youtube.com/shorts/abc123", "transcript": "first"})),
            rec(json!({"videoId": "xyz789", "captions": [{"text": "a"}, {"text": "b"}]})),
            rec(json!({"url": "https://example.com/no-id", "transcript": "orphan"})),
            rec(json!({"id": "empty", "transcript": ""})),
            rec(json!({"id": "abc123", "text": "second"})),
        ];

        let map = TranscriptMap::from_records(&records);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("abc123"), Some("second"));
        assert_eq!(map.get("xyz789"), Some("a b"));
        assert_eq!(map.get("empty"), None);
    }

    #[test]
    fn test_canonical_record_field_priority() {
        let record = rec(json!({
            "name": "Fallback title",
            "views": "1,234 views",
            "likeCount": 56,
            "likes": 1,
            "publishedAt": "2024-03-01T10:00:00Z",
            "videoUrl": "https://www.youtube.com/shorts/abc123?feature=share"
        }));
        let mut transcripts = TranscriptMap::new();
        transcripts.insert("abc123", "hello");

        let merged = canonical_record(&record, &transcripts);

        assert_eq!(merged.title, "Fallback title");
        assert_eq!(merged.views, Some(Metric::Count(1234)));
        assert_eq!(merged.likes, Some(Metric::Count(56)));
        assert_eq!(merged.release_date, "2024-03-01");
        assert_eq!(merged.video_id.as_deref(), Some("abc123"));
        assert_eq!(
            merged.video_url.as_deref(),
            Some("https://www.youtube.com/shorts/abc123?feature=share")
        );
        assert_eq!(merged.transcript, "hello");
    }

    #[test]
    fn test_unresolvable_record_is_kept_with_sentinels() {
        let merged = merge_records(&[rec(json!({"foo": "bar"}))], &TranscriptMap::new());

        assert_eq!(merged.len(), 1);
        assert_eq!(
            merged[0],
            CanonicalVideoRecord {
                title: "N/A".to_string(),
                views: None,
                likes: None,
                release_date: "N/A".to_string(),
                video_url: None,
                video_id: None,
                transcript: "N/A".to_string(),
            }
        );
    }

    #[test]
    fn test_url_synthesized_from_id() {
        let merged = canonical_record(&rec(json!({"id": "xyz789"})), &TranscriptMap::new());
        assert_eq!(merged.video_url.as_deref(), Some("https://www.youtube.com/shorts/xyz789"));
        assert_eq!(merged.transcript, "N/A");
        assert!(!merged.has_transcript());
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let records = vec![rec(json!({"id": "same"})), rec(json!({"id": "same"}))];
        assert_eq!(merge_records(&records, &TranscriptMap::new()).len(), 2);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let records = vec![
            rec(json!({"id": "abc123", "title": "Ünïcödé 🎬", "viewCount": 10})),
            rec(json!({"url": "https://youtu.be/xyz789?si=1", "views": "N/A"})),
        ];
        let transcripts: TranscriptMap = vec![("abc123".to_string(), "text".to_string())]
            .into_iter()
            .collect();

        let first = serde_json::to_string_pretty(&merge_records(&records, &transcripts)).unwrap();
        let second = serde_json::to_string_pretty(&merge_records(&records, &transcripts)).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"views\": \"N/A\""));
    }

    #[test]
    fn test_serialized_field_order() {
        let merged = canonical_record(&rec(json!({"id": "a"})), &TranscriptMap::new());
        let json = serde_json::to_string(&merged).unwrap();
        let positions: Vec<usize> = ["title", "views", "likes", "release_date", "video_url", "video_id", "transcript"]
            .iter()
            .map(|key| json.find(&format!("\"{}\":", key)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
