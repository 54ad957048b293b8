//! Fail-soft coercion of provider value encodings into canonical forms.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::NOT_AVAILABLE;

/// A count-like field (views, likes) after coercion.
///
/// Counts that cannot be parsed stay textual rather than being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Count(i64),
    Text(String),
}

/// Coerce a raw count value. Null yields `None`; nothing here ever fails.
pub fn coerce_count(value: &Value) -> Option<Metric> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(
            n.as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Metric::Count)
                .unwrap_or_else(|| Metric::Text(n.to_string())),
        ),
        Value::String(s) => Some(coerce_count_str(s)),
        other => Some(Metric::Text(other.to_string())),
    }
}

fn coerce_count_str(raw: &str) -> Metric {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();

    if let Ok(count) = cleaned.parse::<i64>() {
        return Metric::Count(count);
    }

    // "1234 views" -> 1234; the unit is only dropped when a number remains
    match cleaned.rsplit_once(char::is_whitespace) {
        Some((head, unit)) if !unit.is_empty() && unit.chars().all(char::is_alphabetic) => {
            match head.trim().parse::<i64>() {
                Ok(count) => Metric::Count(count),
                Err(_) => Metric::Text(cleaned.to_string()),
            }
        }
        _ => Metric::Text(cleaned.to_string()),
    }
}

/// Coerce a transcript payload to plain text.
///
/// Plain strings pass through untouched, objects contribute their `text` (or
/// `content`) field, and segment lists are space-joined in order.
pub fn transcript_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Object(_) => segment_text(value),
        Value::Array(segments) => segments
            .iter()
            .map(segment_text)
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_string(),
    }
}

fn segment_text(segment: &Value) -> String {
    match segment {
        Value::Object(map) => ["text", "content"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_default(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Normalize a release date to `YYYY-MM-DD`.
///
/// Compact `YYYYMMDD` dates and RFC 3339 timestamps are converted; any other
/// non-empty text is kept verbatim.
pub fn normalize_release_date(value: Option<&Value>) -> String {
    let raw = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return NOT_AVAILABLE.to_string(),
    };

    if raw.is_empty() {
        return NOT_AVAILABLE.to_string();
    }

    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y%m%d") {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&raw) {
        return timestamp.date_naive().format("%Y-%m-%d").to_string();
    }

    if let Some(prefix) = raw.get(..10) {
        if NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok() {
            return prefix.to_string();
        }
    }

    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_count_strings() {
        assert_eq!(coerce_count(&json!("1,234 views")), Some(Metric::Count(1234)));
        assert_eq!(coerce_count(&json!("12,000")), Some(Metric::Count(12000)));
        assert_eq!(coerce_count(&json!("N/A")), Some(Metric::Text("N/A".to_string())));
        assert_eq!(coerce_count(&json!("1.2K views")), Some(Metric::Text("1.2K views".to_string())));
        assert_eq!(coerce_count(&json!("Views hidden")), Some(Metric::Text("Views hidden".to_string())));
        assert_eq!(
            coerce_count(&json!("Likes disabled by creator")),
            Some(Metric::Text("Likes disabled by creator".to_string()))
        );
    }

    #[test]
    fn test_coerce_count_numbers() {
        assert_eq!(coerce_count(&json!(42)), Some(Metric::Count(42)));
        assert_eq!(coerce_count(&json!(7.0)), Some(Metric::Count(7)));
        assert_eq!(coerce_count(&json!(null)), None);
    }

    #[test]
    fn test_metric_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Metric::Count(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Metric::Text("N/A".into())).unwrap(), "\"N/A\"");
    }

    #[test]
    fn test_transcript_text_segments() {
        let segments = json!([{"text": "a"}, {"text": "b"}, {"text": "c"}]);
        assert_eq!(transcript_text(&segments), "a b c");
    }

    #[test]
    fn test_transcript_text_is_idempotent_on_strings() {
        let once = transcript_text(&json!("hello world"));
        let twice = transcript_text(&Value::String(once.clone()));
        assert_eq!(once, "hello world");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_transcript_text_objects() {
        assert_eq!(transcript_text(&json!({"text": "main", "content": "alt"})), "main");
        assert_eq!(transcript_text(&json!({"text": "", "content": "alt"})), "alt");
        assert_eq!(transcript_text(&json!(["plain", {"content": "seg"}])), "plain seg");
        assert_eq!(transcript_text(&json!(17)), "17");
    }

    #[test]
    fn test_normalize_release_date() {
        assert_eq!(normalize_release_date(Some(&json!("20240105"))), "2024-01-05");
        assert_eq!(normalize_release_date(Some(&json!("2024-01-05T12:30:00.000Z"))), "2024-01-05");
        assert_eq!(normalize_release_date(Some(&json!("2023-11-30"))), "2023-11-30");
        assert_eq!(normalize_release_date(Some(&json!("3 days ago"))), "3 days ago");
        assert_eq!(normalize_release_date(Some(&json!(""))), "N/A");
        assert_eq!(normalize_release_date(None), "N/A");
    }
}
