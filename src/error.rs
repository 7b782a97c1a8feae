//! Error taxonomy for talking to the revision services and the cache store.
//!
//! | Variant | Raised by | Handling |
//! |---------|-----------|----------|
//! | [`NotFound`](RevisionError::NotFound) | revision listing | fatal for the run |
//! | [`Transport`](RevisionError::Transport) | listing / rendering | fatal for listing, soft for rendering |
//! | [`RateLimited`](RevisionError::RateLimited) | rendering | retried with backoff, then soft |
//! | [`MalformedResponse`](RevisionError::MalformedResponse) | listing / rendering | fatal for listing, soft for rendering |
//! | [`CorruptCache`](RevisionError::CorruptCache) | cache load | logged, cache treated as empty |

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("page not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by the remote service")]
    RateLimited,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("corrupt cache: {0}")]
    CorruptCache(String),
}

impl RevisionError {
    /// Whether a content request that failed this way is worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RevisionError::RateLimited)
    }
}

impl From<reqwest::Error> for RevisionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RevisionError::MalformedResponse(err.to_string())
        } else {
            RevisionError::Transport(err.to_string())
        }
    }
}
