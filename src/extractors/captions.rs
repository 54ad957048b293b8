//! Parsing of yt-dlp `json3` subtitle files.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Result;

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Flatten a json3 document into space-joined caption text.
///
/// Each event becomes one segment; events with no visible text are skipped.
/// Returns `None` when nothing readable remains.
pub fn parse_json3(content: &str) -> Result<Option<String>> {
    let doc: Json3 = serde_json::from_str(content)?;

    let segments: Vec<String> = doc
        .events
        .iter()
        .map(|event| {
            let text: String = event.segs.iter().map(|seg| seg.utf8.as_str()).collect();
            text.replace('\n', " ").trim().to_string()
        })
        .filter(|text| !text.is_empty())
        .collect();

    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(segments.join(" ")))
    }
}

/// Pick the subtitle file to read among those yt-dlp wrote into `dir`.
/// Plain `en` tracks win over regional variants.
pub fn find_subtitle_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut candidates: Vec<PathBuf> = fs_err::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json3"))
        .collect();

    candidates.sort();
    let preferred = candidates
        .iter()
        .position(|path| path.to_string_lossy().ends_with(".en.json3"))
        .unwrap_or(0);

    Ok(if candidates.is_empty() {
        None
    } else {
        Some(candidates.swap_remove(preferred))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3_joins_events() {
        let content = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "segs": [{"utf8": "hello"}, {"utf8": " there"}]},
                {"tStartMs": 900, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 1000},
                {"tStartMs": 1200, "segs": [{"utf8": "general\nkenobi"}]}
            ]
        }"#;
        assert_eq!(parse_json3(content).unwrap().as_deref(), Some("hello there general kenobi"));
    }

    #[test]
    fn test_parse_json3_without_text() {
        assert_eq!(parse_json3(r#"{"events": []}"#).unwrap(), None);
        assert!(parse_json3("not json").is_err());
    }

    #[test]
    fn test_find_subtitle_file_prefers_plain_english() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("abc.en-US.json3"), "{}").unwrap();
        fs_err::write(dir.path().join("abc.en.json3"), "{}").unwrap();
        fs_err::write(dir.path().join("abc.info.json"), "{}").unwrap();

        let found = find_subtitle_file(dir.path()).unwrap().unwrap();
        assert!(found.ends_with("abc.en.json3"));
    }

    #[test]
    fn test_find_subtitle_file_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_subtitle_file(dir.path()).unwrap(), None);
    }
}
