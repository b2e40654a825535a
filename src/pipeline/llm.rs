//! Remote model calls: timeout, optional retry, empty-reply detection.
//!
//! Both stages go through [`call_model`], so the failure taxonomy is the
//! same for each: a call that exceeds `api_timeout_secs` is an
//! `UpstreamTimeout`, a transport/API error is `UpstreamFailed`, and a reply
//! with no text is `UpstreamEmptyResponse`.
//!
//! ## Retry Strategy
//!
//! Off by default (`max_retries = 0`): a generative call is not idempotent,
//! and retrying changes both its output and its cost. When enabled, only
//! timeouts and transport failures are retried, with exponential backoff
//! `retry_backoff_ms * 2^(attempt-1)`: 500 ms → 1 s → 2 s, capped at
//! [`MAX_BACKOFF_MS`]. An empty reply is an answer, not a failure to answer,
//! and is never retried.

use crate::client::{Completion, ModelClient, ModelRequest};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Stage};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Longest wait between two attempts.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms
        .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
        .min(MAX_BACKOFF_MS)
}

/// Send `request` to `client` under the configured timeout and retry policy.
pub async fn call_model(
    client: &dyn ModelClient,
    stage: Stage,
    request: ModelRequest,
    config: &AnalyzerConfig,
) -> Result<Completion, AnalysisError> {
    let limit = Duration::from_secs(config.api_timeout_secs);
    let mut attempt: u32 = 0;

    loop {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                stage, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let outcome = match timeout(limit, client.complete(request.clone())).await {
            Err(_) => Err(AnalysisError::UpstreamTimeout {
                stage,
                secs: config.api_timeout_secs,
            }),
            Ok(Err(e)) => Err(AnalysisError::UpstreamFailed {
                stage,
                message: e.to_string(),
            }),
            Ok(Ok(completion)) => Ok(completion),
        };

        match outcome {
            Ok(completion) => {
                debug!(
                    "{}: {} input tokens, {} output tokens",
                    stage, completion.input_tokens, completion.output_tokens
                );
                if completion.text.trim().is_empty() {
                    return Err(AnalysisError::UpstreamEmptyResponse { stage });
                }
                return Ok(completion);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                warn!("{}: attempt {} failed: {}", stage, attempt + 1, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(500, 200), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(u64::MAX, 2), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(0, u32::MAX), 0);
    }

    enum Step {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct Scripted {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for Scripted {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: ModelRequest) -> Result<Completion, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Reply(text)) => Ok(Completion::text(text)),
                Some(Step::Fail) | None => Err(ClientError("503 Service Unavailable".into())),
                Some(Step::Hang) => {
                    sleep(Duration::from_secs(3600)).await;
                    Ok(Completion::text("too late"))
                }
            }
        }
    }

    fn request() -> ModelRequest {
        ModelRequest {
            prompt: "p".into(),
            images: vec![],
            temperature: 0.0,
            max_tokens: 10,
        }
    }

    fn config(max_retries: u32) -> AnalyzerConfig {
        AnalyzerConfig::builder()
            .max_retries(max_retries)
            .retry_backoff_ms(1)
            .api_timeout_secs(5)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let client = Scripted::new(vec![Step::Fail, Step::Reply("ok")]);
        let err = call_model(&client, Stage::Vision, request(), &config(0)).await.unwrap_err();
        assert!(matches!(err, AnalysisError::UpstreamFailed { stage: Stage::Vision, .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transport_failures_when_enabled() {
        let client = Scripted::new(vec![Step::Fail, Step::Fail, Step::Reply("ok")]);
        let out = call_model(&client, Stage::Vision, request(), &config(2)).await.unwrap();
        assert_eq!(out.text, "ok");
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_reply_is_not_retried() {
        let client = Scripted::new(vec![Step::Reply("  \n"), Step::Reply("ok")]);
        let err = call_model(&client, Stage::Structuring, request(), &config(3)).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UpstreamEmptyResponse { stage: Stage::Structuring }
        ));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let client = Scripted::new(vec![Step::Hang]);
        let err = call_model(&client, Stage::Vision, request(), &config(0)).await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UpstreamTimeout { stage: Stage::Vision, secs: 5 }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_retryable() {
        let client = Scripted::new(vec![Step::Hang, Step::Reply("second")]);
        let out = call_model(&client, Stage::Vision, request(), &config(1)).await.unwrap();
        assert_eq!(out.text, "second");
    }
}
