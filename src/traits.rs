//! Seams to the two remote collaborators.
//!
//! The engine never talks HTTP directly: it drives a [`RevisionIndex`] to
//! learn which revisions exist and a [`ContentSource`] to render a single
//! revision's lead section. [`crate::mediawiki::MediaWikiClient`] implements
//! both against the MediaWiki Action API; tests substitute in-process fakes.
//!
//! ```text
//! ┌───────────────┐   list_revisions   ┌──────────────┐
//! │ RevisionIndex │──────────────────▶│              │
//! └───────────────┘                    │    Engine    │
//! ┌───────────────┐    render_lead     │  (analyze)   │
//! │ ContentSource │──────────────────▶│              │
//! └───────────────┘                    └──────────────┘
//! ```

use async_trait::async_trait;

use crate::error::RevisionError;
use crate::models::RevisionRef;

/// Lists every revision of a page.
#[async_trait]
pub trait RevisionIndex: Send + Sync {
    /// All revisions of `title`, oldest first.
    ///
    /// Implementations follow pagination until the service stops returning
    /// a continuation token.
    ///
    /// # Errors
    ///
    /// - [`RevisionError::NotFound`] when the page does not exist.
    /// - [`RevisionError::Transport`] / [`RevisionError::MalformedResponse`]
    ///   for any other failure.
    async fn list_revisions(&self, title: &str) -> Result<Vec<RevisionRef>, RevisionError>;
}

/// Renders the lead section of one revision.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Rendered markup of the lead section of `revision_id`.
    ///
    /// Rate limiting must surface as [`RevisionError::RateLimited`] so the
    /// fetcher can back off.
    async fn render_lead(&self, revision_id: &str) -> Result<String, RevisionError>;
}
