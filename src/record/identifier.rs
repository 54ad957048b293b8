use super::{fields, first_text, RawRecord};

/// URL conventions a video id can be read from, in match priority order.
/// Each pairs the marker preceding the id with the character that starts the
/// trailing query.
const URL_CONVENTIONS: &[(&str, char)] = &[
    ("youtube.com/shorts/", '?'),
    ("youtube.com/watch?v=", '&'),
    ("youtu.be/", '?'),
];

/// Derive the canonical video id of a raw record.
///
/// A direct id field always wins. Otherwise the first present URL field is
/// matched against the known URL conventions.
pub fn extract_video_id(record: &RawRecord) -> Option<String> {
    if let Some(id) = first_text(record, fields::ID).filter(|id| !id.is_empty()) {
        return Some(id);
    }

    let url = first_text(record, fields::URL)?;
    video_id_from_url(&url)
}

/// Read a video id out of a URL, trying each convention in order.
pub fn video_id_from_url(url: &str) -> Option<String> {
    let (marker, terminator) = URL_CONVENTIONS
        .iter()
        .find(|(marker, _)| url.contains(marker))?;

    let (_, tail) = url.rsplit_once(marker)?;
    let id = tail
        .split(|c: char| c == *terminator || c == '#')
        .next()
        .unwrap_or_default();

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Canonical short-form URL for a video id.
pub fn short_url(video_id: &str) -> String {
    format!("https://www.youtube.com/shorts/{}", video_id)
}
