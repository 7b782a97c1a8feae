//! Per-revision content fetching with politeness throttle and bounded retry.
//!
//! # Retry Strategy
//!
//! - Rate limited → wait and retry, doubling the wait each time
//!   (`base`, `2·base`, `4·base`, ...) up to `max_retries` retries.
//!   With the defaults that is 5s, 10s, 20s.
//! - Any other failure → give up immediately.
//! - Giving up is a soft failure: the revision simply has no sentence.
//!
//! Consecutive requests are spaced by at least the configured throttle,
//! independent of any backoff.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::RevisionError;
use crate::normalize::Normalizer;
use crate::traits::ContentSource;

/// Timing knobs for [`ContentFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub throttle: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl FetchPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            throttle: config.throttle(),
            max_retries: config.max_retries,
            backoff_base: config.backoff_base(),
        }
    }

    /// Wait before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_base * (1u32 << (retry.saturating_sub(1)).min(16))
    }
}

/// Result of fetching one revision.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Content rendered and a sentence was extracted.
    Sentence(String),
    /// Content rendered but contained no extractable text.
    NoSentence,
    /// The request failed (after retries, where applicable).
    Failed(RevisionError),
}

impl FetchOutcome {
    pub fn into_sentence(self) -> Option<String> {
        match self {
            FetchOutcome::Sentence(s) => Some(s),
            FetchOutcome::NoSentence | FetchOutcome::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// Fetches revisions one at a time and normalizes their lead sentence.
pub struct ContentFetcher<'a> {
    source: &'a dyn ContentSource,
    normalizer: &'a Normalizer,
    policy: FetchPolicy,
    last_request: Option<Instant>,
}

impl<'a> ContentFetcher<'a> {
    pub fn new(
        source: &'a dyn ContentSource,
        normalizer: &'a Normalizer,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            source,
            normalizer,
            policy,
            last_request: None,
        }
    }

    /// Canonical sentence of `revision_id`, or `None` on soft failure.
    pub async fn fetch_sentence(&mut self, revision_id: &str) -> Option<String> {
        self.fetch(revision_id).await.into_sentence()
    }

    /// Fetch and normalize `revision_id`, reporting why nothing came back.
    pub async fn fetch(&mut self, revision_id: &str) -> FetchOutcome {
        let mut retry = 0u32;
        loop {
            self.throttle().await;

            match self.source.render_lead(revision_id).await {
                Ok(markup) => {
                    return match self.normalizer.normalize(&markup) {
                        Some(sentence) => FetchOutcome::Sentence(sentence),
                        None => {
                            debug!(revision_id, "no sentence in rendered content");
                            FetchOutcome::NoSentence
                        }
                    };
                }
                Err(err) if err.is_retryable() && retry < self.policy.max_retries => {
                    retry += 1;
                    let delay = self.policy.backoff(retry);
                    warn!(
                        revision_id,
                        retry,
                        delay_secs = delay.as_secs_f64(),
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(revision_id, error = %err, "giving up on revision");
                    return FetchOutcome::Failed(err);
                }
            }
        }
    }

    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.policy.throttle {
                tokio::time::sleep(self.policy.throttle - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}
