//! Stage compositions: which inputs go to which provider list.

pub mod free;

use crate::providers::{FallbackResult, ProviderDescriptor, ProviderRunner};
use crate::record::{extract_video_id, fields, first_text, short_url, RawRecord};

/// Fetch the channel's raw metadata records from the first provider that
/// returns any.
pub async fn collect_metadata(
    runner: &ProviderRunner<'_>,
    providers: &[ProviderDescriptor],
    channel_url: &str,
) -> FallbackResult {
    tracing::info!("Starting shorts metadata collection for {}", channel_url);

    let result = runner.run(providers, &[channel_url.to_string()]).await;
    if let Some(provider) = result.provider {
        tracing::info!("{} shorts collected by {}", result.records.len(), provider);
    }
    result
}

/// Per-video URLs to request transcripts for, in metadata order.
///
/// A record without a URL field falls back to the canonical short URL of its
/// id; records with neither are skipped.
pub fn video_urls(metadata: &[RawRecord]) -> Vec<String> {
    metadata
        .iter()
        .filter_map(|record| {
            first_text(record, fields::URL)
                .filter(|url| !url.is_empty())
                .or_else(|| extract_video_id(record).map(|id| short_url(&id)))
        })
        .collect()
}

/// Fetch transcript records for every video in `metadata`.
pub async fn collect_transcripts(
    runner: &ProviderRunner<'_>,
    providers: &[ProviderDescriptor],
    metadata: &[RawRecord],
) -> FallbackResult {
    let urls = video_urls(metadata);

    if urls.is_empty() {
        tracing::warn!("No video URLs found, skipping transcript collection");
        return FallbackResult::default();
    }

    tracing::info!("{} videos to transcribe", urls.len());
    runner.run(providers, &urls).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{InvocationMode, ProviderBackend};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn rec(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[derive(Default)]
    struct RecordingBackend {
        requests: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl ProviderBackend for RecordingBackend {
        async fn invoke(&self, _provider: &str, request: Value) -> crate::Result<Vec<RawRecord>> {
            self.requests.lock().unwrap().push(request);
            Ok(vec![rec(json!({"id": "x", "transcript": "t"}))])
        }

        fn backend_name(&self) -> &'static str {
            "recording"
        }
    }

    fn urls_request(inputs: &[String]) -> Value {
        json!({ "urls": inputs })
    }

    fn always(_: &[RawRecord]) -> bool {
        true
    }

    const PROVIDERS: &[ProviderDescriptor] = &[ProviderDescriptor {
        name: "only",
        build_request: urls_request,
        mode: InvocationMode::Batch,
        success: always,
    }];

    #[test]
    fn test_video_urls_prefers_url_then_id() {
        let metadata = vec![
            rec(json!({"url": "https://www.youtube.com/shorts/aaa", "id": "ignored"})),
            rec(json!({"videoId": "bbb"})),
            rec(json!({"title": "nothing usable"})),
            rec(json!({"videoUrl": "https://youtu.be/ccc"})),
        ];

        assert_eq!(
            video_urls(&metadata),
            vec![
                "https://www.youtube.com/shorts/aaa",
                "https://www.youtube.com/shorts/bbb",
                "https://youtu.be/ccc",
            ]
        );
    }

    #[tokio::test]
    async fn test_metadata_request_uses_channel_url() {
        let backend = RecordingBackend::default();
        let runner = ProviderRunner::new(&backend);

        let result = collect_metadata(&runner, PROVIDERS, "https://www.youtube.com/@c/shorts").await;

        assert_eq!(result.provider, Some("only"));
        assert_eq!(
            backend.requests.lock().unwrap()[0],
            json!({"urls": ["https://www.youtube.com/@c/shorts"]})
        );
    }

    #[tokio::test]
    async fn test_transcripts_skipped_without_urls() {
        let backend = RecordingBackend::default();
        let runner = ProviderRunner::new(&backend);

        let result = collect_transcripts(&runner, PROVIDERS, &[rec(json!({"title": "x"}))]).await;

        assert!(!result.succeeded());
        assert!(backend.requests.lock().unwrap().is_empty());
    }
}
