//! Analysis pipeline orchestration.
//!
//! Coordinates the full run: revision index → cache diff → content fetch →
//! checkpointed cache → timeline → aggregation → saved record. All
//! collaborators are passed in through [`Engine`], so the same flow runs
//! against MediaWiki in the CLI and against fakes in tests.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::aggregate::aggregate;
use crate::cache::{self, RevisionCache};
use crate::config::Config;
use crate::fetcher::{ContentFetcher, FetchPolicy};
use crate::mediawiki::MediaWikiClient;
use crate::models::{CacheEntry, SentenceStat};
use crate::normalize::Normalizer;
use crate::progress::{NoProgress, ProgressEvent, ProgressReporter};
use crate::report;
use crate::store::{CacheStore, JsonFileStore};
use crate::timeline::reconstruct;
use crate::traits::{ContentSource, RevisionIndex};

static NO_PROGRESS: NoProgress = NoProgress;

/// Per-run switches.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Ignore the stored cache and fetch every revision.
    pub full: bool,
    /// Re-fetch revisions cached as soft failures.
    pub retry_failed: bool,
    /// Fetch at most this many revisions in this run.
    pub limit: Option<usize>,
    /// List and diff only: no fetching, no saving.
    pub dry_run: bool,
    /// Analysis instant; defaults to the current time after fetching.
    pub as_of: Option<DateTime<Utc>>,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub article: String,
    pub analyzed_at: DateTime<Utc>,
    pub total_revisions: usize,
    /// Revisions already cached before this run.
    pub cached: usize,
    /// Revisions still missing after this run (non-zero with `limit`/`dry_run`).
    pub pending: usize,
    pub fetched: usize,
    /// Fetches in this run that ended as soft failures.
    pub failed: usize,
    pub stats: Vec<SentenceStat>,
}

/// The reconstruction engine with its injected collaborators.
pub struct Engine<'a> {
    index: &'a dyn RevisionIndex,
    content: &'a dyn ContentSource,
    store: &'a dyn CacheStore,
    normalizer: &'a Normalizer,
    policy: FetchPolicy,
    checkpoint_every: usize,
    progress: &'a dyn ProgressReporter,
}

impl<'a> Engine<'a> {
    pub fn new(
        index: &'a dyn RevisionIndex,
        content: &'a dyn ContentSource,
        store: &'a dyn CacheStore,
        normalizer: &'a Normalizer,
    ) -> Self {
        Self {
            index,
            content,
            store,
            normalizer,
            policy: FetchPolicy::default(),
            checkpoint_every: 100,
            progress: &NO_PROGRESS,
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every.max(1);
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Run the analysis for `article`.
    ///
    /// # Errors
    ///
    /// Listing failures ([`RevisionError::NotFound`](crate::error::RevisionError::NotFound),
    /// transport or malformed responses) abort the run; the underlying
    /// `RevisionError` can be recovered with `downcast_ref`. Failures to
    /// save the record are also fatal. Per-revision fetch failures are not.
    pub async fn run(&self, article: &str, options: &AnalysisOptions) -> Result<Analysis> {
        self.progress.report(ProgressEvent::Listing {
            article: article.to_string(),
        });
        let revisions = self
            .index
            .list_revisions(article)
            .await
            .with_context(|| format!("Failed to list revisions of '{}'", article))?;
        info!(article, revisions = revisions.len(), "revision index listed");

        let mut cache = if options.full {
            RevisionCache::new(article)
        } else {
            RevisionCache::load(self.store, article, self.normalizer).await.0
        };
        let redated = cache.align_timestamps(&revisions);
        if redated > 0 {
            debug!(redated, "cache timestamps aligned with revision index");
        }

        let all_ids: HashSet<String> = revisions.iter().map(|r| r.id.clone()).collect();
        let known_ids = if options.retry_failed {
            cache.resolved_ids()
        } else {
            cache.ids()
        };
        let missing = cache::diff(&all_ids, &known_ids);
        let cached = all_ids.len() - missing.len();

        // fetch in index order so checkpoints cover a prefix of history
        let mut to_fetch: Vec<_> = revisions.iter().filter(|r| missing.contains(&r.id)).collect();
        if let Some(limit) = options.limit {
            to_fetch.truncate(limit);
        }
        if options.dry_run {
            to_fetch.clear();
        }
        let total = to_fetch.len() as u64;

        self.progress.report(ProgressEvent::Planned {
            article: article.to_string(),
            revisions: revisions.len() as u64,
            cached: cached as u64,
            pending: missing.len() as u64,
        });

        let mut fetcher = ContentFetcher::new(self.content, self.normalizer, self.policy);
        let mut fetched = 0usize;
        let mut failed = 0usize;

        for revision in &to_fetch {
            let outcome = fetcher.fetch(&revision.id).await;
            if outcome.is_failure() {
                failed += 1;
            }
            cache.merge(
                revision.id.clone(),
                CacheEntry::new(revision.timestamp, outcome.into_sentence()),
            );
            fetched += 1;

            self.progress.report(ProgressEvent::Fetching {
                article: article.to_string(),
                n: fetched as u64,
                total,
            });

            if fetched % self.checkpoint_every == 0 && fetched < to_fetch.len() {
                cache.checkpoint_save(self.store).await?;
                self.progress.report(ProgressEvent::Checkpoint {
                    article: article.to_string(),
                    entries: cache.len() as u64,
                });
            }
        }

        let analyzed_at = options.as_of.unwrap_or_else(Utc::now);
        let observations = cache.observations(&revisions);
        debug!(observations = observations.len(), "reconstructing timeline");
        let stats = aggregate(reconstruct(&observations, analyzed_at));

        if !options.dry_run {
            let record = cache.to_record(&stats, revisions.len(), analyzed_at);
            cache::save_record(self.store, &record).await?;
            self.progress.report(ProgressEvent::Checkpoint {
                article: article.to_string(),
                entries: cache.len() as u64,
            });
        }

        Ok(Analysis {
            article: article.to_string(),
            analyzed_at,
            total_revisions: revisions.len(),
            cached,
            pending: missing.len() - fetched,
            fetched,
            failed,
            stats,
        })
    }
}

/// CLI entry point for `lede analyze`.
pub async fn run_analyze(
    config: &Config,
    article: &str,
    output: Option<PathBuf>,
    options: AnalysisOptions,
    progress: &dyn ProgressReporter,
) -> Result<()> {
    let client = MediaWikiClient::new(&config.wiki, &config.fetch)
        .context("Failed to build HTTP client")?;
    let normalizer = Normalizer::from_config(&config.normalize)?;
    let path = output.unwrap_or_else(|| config.record_path(article));
    let store = JsonFileStore::new(&path);

    let engine = Engine::new(&client, &client, &store, &normalizer)
        .with_policy(FetchPolicy::from_config(&config.fetch))
        .with_checkpoint_every(config.fetch.checkpoint_every)
        .with_progress(progress);

    let analysis = engine.run(article, &options).await?;

    if options.dry_run {
        println!("analyze {} (dry-run)", article);
        println!("  revisions: {}", analysis.total_revisions);
        println!("  cached: {}", analysis.cached);
        println!("  to fetch: {}", analysis.pending);
        return Ok(());
    }

    report::print_analysis(&analysis);
    println!();
    println!("Results saved to: {}", path.display());
    Ok(())
}
