//! Metadata collection for the free edition: list the channel's shorts, then
//! look each one up individually.

use anyhow::Context;
use serde_json::{json, Value};
use std::time::Duration;

use crate::extractors::ChannelSource;
use crate::record::{short_url, RawRecord};
use crate::utils;
use crate::{CollectorError, Result};

/// Ids of every short on the channel. An empty listing is fatal.
pub async fn list_shorts(source: &dyn ChannelSource, channel_url: &str) -> Result<Vec<String>> {
    tracing::info!("Listing shorts from {}", channel_url);

    let ids = source
        .list_shorts(channel_url)
        .await
        .with_context(|| format!("Failed to list shorts for {}", channel_url))?;

    if ids.is_empty() {
        return Err(CollectorError::NoShortsFound {
            channel: channel_url.to_string(),
        }
        .into());
    }

    tracing::info!("Found {} shorts", ids.len());
    Ok(ids)
}

/// One raw record per id, in order. A failed lookup yields a record holding
/// only the id and URL.
pub async fn collect_metadata(
    source: &dyn ChannelSource,
    video_ids: &[String],
    delay: Duration,
    show_progress: bool,
) -> Vec<RawRecord> {
    tracing::info!("Collecting metadata for {} videos", video_ids.len());
    let progress = utils::item_progress(video_ids.len() as u64, "Collecting metadata", show_progress);

    let mut records = Vec::with_capacity(video_ids.len());
    let mut successful = 0usize;

    for (index, video_id) in video_ids.iter().enumerate() {
        if index > 0 {
            utils::pause(delay).await;
        }

        let record = match source.video_metadata(video_id).await {
            Ok(record) => {
                successful += 1;
                record
            }
            Err(e) => {
                tracing::warn!("Failed to get metadata for {}: {:#}", video_id, e);
                placeholder_record(video_id)
            }
        };
        records.push(record);
        progress.inc(1);
    }

    progress.finish_and_clear();
    tracing::info!("Metadata collected: {}/{} successful", successful, video_ids.len());
    records
}

fn placeholder_record(video_id: &str) -> RawRecord {
    match json!({ "id": video_id, "url": short_url(video_id) }) {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::MockChannelSource;
    use crate::merge::{merge_records, TranscriptMap};

    #[tokio::test]
    async fn test_empty_listing_is_fatal() {
        let mut source = MockChannelSource::new();
        source.expect_list_shorts().returning(|_| Ok(Vec::new()));

        let err = list_shorts(&source, "https://www.youtube.com/@empty/shorts")
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CollectorError>(),
            Some(CollectorError::NoShortsFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_lookup_keeps_placeholder() {
        let mut source = MockChannelSource::new();
        source.expect_video_metadata().returning(|id| {
            if id == "gone" {
                Err(anyhow::anyhow!("Video unavailable"))
            } else {
                Ok(json!({"id": id, "title": "Good", "view_count": 3})
                    .as_object()
                    .cloned()
                    .unwrap())
            }
        });

        let ids = vec!["ok1".to_string(), "gone".to_string()];
        let records = collect_metadata(&source, &ids, Duration::ZERO, false).await;

        assert_eq!(records.len(), 2);
        let merged = merge_records(&records, &TranscriptMap::new());
        assert_eq!(merged[0].title, "Good");
        assert_eq!(merged[1].title, "N/A");
        assert_eq!(merged[1].video_id.as_deref(), Some("gone"));
        assert_eq!(merged[1].video_url.as_deref(), Some("https://www.youtube.com/shorts/gone"));
        assert_eq!(merged[1].views, None);
    }
}
