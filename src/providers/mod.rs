use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub mod apify;
pub mod catalog;

use crate::record::RawRecord;
use crate::utils;
use crate::Result;

/// How a provider consumes the inputs of one logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// One request carrying every input
    Batch,
    /// One request per input
    PerItem,
}

impl InvocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationMode::Batch => "batch",
            InvocationMode::PerItem => "per-item",
        }
    }
}

/// Builds the request payload for a provider from its inputs.
pub type RequestBuilder = fn(&[String]) -> Value;

/// Decides whether a provider's output is usable.
pub type SuccessPredicate = fn(&[RawRecord]) -> bool;

/// Static description of one external provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub build_request: RequestBuilder,
    pub mode: InvocationMode,
    pub success: SuccessPredicate,
}

/// Transport that actually invokes a named provider.
#[async_trait]
pub trait ProviderBackend: Send + Sync {
    /// Invoke `provider` with `request` and return the records it produced
    async fn invoke(&self, provider: &str, request: Value) -> Result<Vec<RawRecord>>;

    /// Name of this backend for logging
    fn backend_name(&self) -> &'static str;
}

/// What happened when a single provider was tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Output satisfied the success predicate and was used
    Accepted { records: usize },
    /// Provider answered but the output was not usable
    Unusable { records: usize },
    /// Invocation failed outright
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: &'static str,
    pub outcome: AttemptOutcome,
}

/// Result of running one logical operation across a provider list.
#[derive(Debug, Clone, Default)]
pub struct FallbackResult {
    /// Records of the accepted provider, empty when none succeeded
    pub records: Vec<RawRecord>,
    /// Provider whose output was used
    pub provider: Option<&'static str>,
    /// Every attempt, in the order made
    pub attempts: Vec<ProviderAttempt>,
}

impl FallbackResult {
    pub fn succeeded(&self) -> bool {
        self.provider.is_some()
    }
}

/// Tries providers strictly in list order until one produces usable output.
///
/// Failures stay local to the provider that raised them: they are logged,
/// recorded as an [`AttemptOutcome`], and the next provider is tried.
pub struct ProviderRunner<'a> {
    backend: &'a dyn ProviderBackend,
    item_delay: Duration,
}

impl<'a> ProviderRunner<'a> {
    pub fn new(backend: &'a dyn ProviderBackend) -> Self {
        Self {
            backend,
            item_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive per-item requests
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub async fn run(&self, providers: &[ProviderDescriptor], inputs: &[String]) -> FallbackResult {
        let mut attempts = Vec::with_capacity(providers.len());

        for provider in providers {
            tracing::info!(
                "Trying {} ({}, {} input(s)) via {}",
                provider.name,
                provider.mode.as_str(),
                inputs.len(),
                self.backend.backend_name()
            );

            let invoked = match provider.mode {
                InvocationMode::Batch => self.invoke_batch(provider, inputs).await,
                InvocationMode::PerItem => Ok(self.invoke_per_item(provider, inputs).await),
            };

            let records = match invoked {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!("Provider {} failed: {:#}", provider.name, e);
                    attempts.push(ProviderAttempt {
                        provider: provider.name,
                        outcome: AttemptOutcome::Failed {
                            reason: format!("{:#}", e),
                        },
                    });
                    continue;
                }
            };

            if (provider.success)(&records) {
                tracing::info!("Provider {} succeeded with {} record(s)", provider.name, records.len());
                attempts.push(ProviderAttempt {
                    provider: provider.name,
                    outcome: AttemptOutcome::Accepted {
                        records: records.len(),
                    },
                });
                return FallbackResult {
                    records,
                    provider: Some(provider.name),
                    attempts,
                };
            }

            tracing::warn!(
                "Provider {} returned {} record(s) without usable data",
                provider.name,
                records.len()
            );
            attempts.push(ProviderAttempt {
                provider: provider.name,
                outcome: AttemptOutcome::Unusable {
                    records: records.len(),
                },
            });
        }

        tracing::warn!("All {} provider(s) exhausted", providers.len());
        FallbackResult {
            records: Vec::new(),
            provider: None,
            attempts,
        }
    }

    async fn invoke_batch(&self, provider: &ProviderDescriptor, inputs: &[String]) -> Result<Vec<RawRecord>> {
        let request = (provider.build_request)(inputs);
        self.backend.invoke(provider.name, request).await
    }

    /// A failing item is skipped; the provider is judged on what the rest produced.
    async fn invoke_per_item(&self, provider: &ProviderDescriptor, inputs: &[String]) -> Vec<RawRecord> {
        let mut collected = Vec::new();

        for (index, input) in inputs.iter().enumerate() {
            if index > 0 {
                utils::pause(self.item_delay).await;
            }

            let request = (provider.build_request)(std::slice::from_ref(input));
            match self.backend.invoke(provider.name, request).await {
                Ok(records) => collected.extend(records),
                Err(e) => tracing::warn!("{} failed for {}: {:#}", provider.name, input, e),
            }
        }

        collected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted backend: each provider name maps to a list of responses
    /// consumed one call at a time.
    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<HashMap<&'static str, Vec<std::result::Result<Vec<RawRecord>, String>>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedBackend {
        fn respond(self, provider: &'static str, response: std::result::Result<Vec<RawRecord>, String>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(provider)
                .or_default()
                .push(response);
            self
        }

        fn called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
        }
    }

    #[async_trait]
    impl ProviderBackend for ScriptedBackend {
        async fn invoke(&self, provider: &str, request: Value) -> Result<Vec<RawRecord>> {
            self.calls.lock().unwrap().push((provider.to_string(), request));
            let mut responses = self.responses.lock().unwrap();
            let queue = responses.get_mut(provider).filter(|q| !q.is_empty());
            match queue.map(|q| q.remove(0)) {
                Some(Ok(records)) => Ok(records),
                Some(Err(reason)) => Err(anyhow::anyhow!(reason)),
                None => Ok(Vec::new()),
            }
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn rec(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn non_empty(records: &[RawRecord]) -> bool {
        !records.is_empty()
    }

    fn urls(inputs: &[String]) -> Value {
        json!({ "urls": inputs })
    }

    fn first_url(inputs: &[String]) -> Value {
        json!({ "videoUrl": inputs[0] })
    }

    fn batch(name: &'static str) -> ProviderDescriptor {
        ProviderDescriptor {
            name,
            build_request: urls,
            mode: InvocationMode::Batch,
            success: non_empty,
        }
    }

    fn inputs(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_successful_provider_wins() {
        let backend = ScriptedBackend::default()
            .respond("one", Err("boom".into()))
            .respond("two", Ok(vec![]))
            .respond("three", Ok(vec![rec(json!({"id": "a"}))]))
            .respond("four", Ok(vec![rec(json!({"id": "never"}))]));
        let runner = ProviderRunner::new(&backend);

        let result = runner
            .run(&[batch("one"), batch("two"), batch("three"), batch("four")], &inputs(&["u"]))
            .await;

        assert_eq!(result.provider, Some("three"));
        assert_eq!(result.records, vec![rec(json!({"id": "a"}))]);
        assert_eq!(backend.called(), vec!["one", "two", "three"]);
        assert!(matches!(result.attempts[0].outcome, AttemptOutcome::Failed { .. }));
        assert_eq!(result.attempts[1].outcome, AttemptOutcome::Unusable { records: 0 });
        assert_eq!(result.attempts[2].outcome, AttemptOutcome::Accepted { records: 1 });
    }

    #[tokio::test]
    async fn test_exhausted_list_returns_empty() {
        let backend = ScriptedBackend::default()
            .respond("one", Err("down".into()))
            .respond("two", Err("down".into()));
        let runner = ProviderRunner::new(&backend);

        let result = runner.run(&[batch("one"), batch("two")], &inputs(&["u"])).await;

        assert!(!result.succeeded());
        assert!(result.records.is_empty());
        assert_eq!(result.attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_per_item_failure_is_isolated() {
        let backend = ScriptedBackend::default()
            .respond("single", Ok(vec![rec(json!({"id": "a"}))]))
            .respond("single", Err("throttled".into()))
            .respond("single", Ok(vec![rec(json!({"id": "c"}))]));
        let runner = ProviderRunner::new(&backend);
        let provider = ProviderDescriptor {
            name: "single",
            build_request: first_url,
            mode: InvocationMode::PerItem,
            success: non_empty,
        };

        let result = runner.run(&[provider], &inputs(&["ua", "ub", "uc"])).await;

        assert_eq!(result.provider, Some("single"));
        assert_eq!(result.records, vec![rec(json!({"id": "a"})), rec(json!({"id": "c"}))]);

        let requests: Vec<Value> = backend.calls.lock().unwrap().iter().map(|(_, r)| r.clone()).collect();
        assert_eq!(
            requests,
            vec![json!({"videoUrl": "ua"}), json!({"videoUrl": "ub"}), json!({"videoUrl": "uc"})]
        );
    }

    #[tokio::test]
    async fn test_batch_request_carries_all_inputs() {
        let backend = ScriptedBackend::default().respond("one", Ok(vec![rec(json!({"id": "a"}))]));
        let runner = ProviderRunner::new(&backend);

        runner.run(&[batch("one")], &inputs(&["u1", "u2"])).await;

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, json!({"urls": ["u1", "u2"]}));
    }
}
