//! Revision cache: what is already known about each revision.
//!
//! Maps revision id → [`CacheEntry`] and lives inside the article's
//! [`AnalysisRecord`]. A run only fetches revisions the cache does not know
//! about (see [`diff`]), merging results back in and saving checkpoints so
//! an interrupted run resumes where it stopped.
//!
//! # Loading
//!
//! - Missing store → empty cache.
//! - Unreadable or unparseable store → empty cache, logged as corrupt.
//! - Record without a `cache` section (older format) → entries are
//!   rebuilt from the period list: each period that names its opening
//!   revision and whose sentence still normalizes becomes an entry dated at
//!   the period start. Everything else is dropped and counted.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::RevisionError;
use crate::models::{CacheEntry, RevisionRef, SentenceStat};
use crate::normalize::Normalizer;
use crate::record::{AnalysisRecord, SentenceRecord, ANALYSIS_DATE_FORMAT};
use crate::store::CacheStore;
use crate::timeline::Observation;

/// Ids present in `all_ids` but not in `cached_ids`.
pub fn diff(all_ids: &HashSet<String>, cached_ids: &HashSet<String>) -> HashSet<String> {
    all_ids.difference(cached_ids).cloned().collect()
}

/// What happened while loading the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries available after loading.
    pub entries: usize,
    /// Entries rebuilt from an older record.
    pub migrated: usize,
    /// Older-record periods that could not be migrated.
    pub dropped: usize,
    /// The store held something unusable and was ignored.
    pub corrupt: bool,
}

#[derive(Debug, Clone)]
pub struct RevisionCache {
    article: String,
    entries: BTreeMap<String, CacheEntry>,
    /// Ranked sentences from the last completed run, kept in checkpoints.
    last_report: Vec<SentenceRecord>,
}

impl RevisionCache {
    pub fn new(article: impl Into<String>) -> Self {
        Self {
            article: article.into(),
            entries: BTreeMap::new(),
            last_report: Vec::new(),
        }
    }

    /// Load the cache for `article` from `store`.
    ///
    /// Never fails: anything unusable yields an empty cache.
    pub async fn load(
        store: &dyn CacheStore,
        article: &str,
        normalizer: &Normalizer,
    ) -> (Self, LoadReport) {
        let text = match store.read().await {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(store = %store.describe(), "no cache yet");
                return (Self::new(article), LoadReport::default());
            }
            Err(e) => {
                let err = RevisionError::CorruptCache(format!("{:#}", e));
                warn!(store = %store.describe(), error = %err, "ignoring unreadable cache");
                return (Self::new(article), corrupt_report());
            }
        };

        let record = match AnalysisRecord::from_json(&text) {
            Ok(record) => record,
            Err(e) => {
                let err = RevisionError::CorruptCache(e.to_string());
                warn!(store = %store.describe(), error = %err, "ignoring malformed cache");
                return (Self::new(article), corrupt_report());
            }
        };

        if !record.article.is_empty() && !same_article(&record.article, article) {
            warn!(
                store = %store.describe(),
                stored = %record.article,
                requested = article,
                "cache belongs to a different article, ignoring"
            );
            return (Self::new(article), LoadReport::default());
        }

        let (cache, report) = Self::from_record(article, record, normalizer);
        if report.migrated > 0 || report.dropped > 0 {
            info!(
                migrated = report.migrated,
                dropped = report.dropped,
                "migrated cache from older record"
            );
        }
        debug!(entries = report.entries, "cache loaded");
        (cache, report)
    }

    /// Build a cache from a parsed record, migrating older records.
    pub fn from_record(
        article: &str,
        record: AnalysisRecord,
        normalizer: &Normalizer,
    ) -> (Self, LoadReport) {
        let mut cache = Self::new(article);
        let mut report = LoadReport::default();

        match record.cache {
            Some(entries) => {
                cache.entries = entries;
            }
            None => {
                for sentence in &record.sentences {
                    let canonical = normalizer.normalize(&sentence.sentence);
                    for period in &sentence.periods {
                        let migrated = match (&canonical, &period.start_revision) {
                            (Some(text), Some(revision)) => period
                                .start_instant()
                                .map(|ts| (revision.clone(), CacheEntry::new(ts, Some(text.clone())))),
                            _ => None,
                        };
                        match migrated {
                            Some((revision, entry)) => {
                                cache.entries.insert(revision, entry);
                                report.migrated += 1;
                            }
                            None => report.dropped += 1,
                        }
                    }
                }
            }
        }

        cache.last_report = record.sentences;
        report.entries = cache.entries.len();
        (cache, report)
    }

    pub fn article(&self) -> &str {
        &self.article
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, revision_id: &str) -> Option<&CacheEntry> {
        self.entries.get(revision_id)
    }

    /// Ids of all cached revisions.
    pub fn ids(&self) -> HashSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Ids of cached revisions that hold a sentence.
    pub fn resolved_ids(&self) -> HashSet<String> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.is_soft_failure())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Number of cached soft failures.
    pub fn soft_failures(&self) -> usize {
        self.entries.values().filter(|e| e.is_soft_failure()).count()
    }

    /// Insert or replace the entry for `revision_id`.
    pub fn merge(&mut self, revision_id: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(revision_id.into(), entry);
    }

    /// Re-date cached entries with the timestamps from `index`.
    ///
    /// Entries migrated from older records only know the day their period
    /// started. Returns the number of entries changed.
    pub fn align_timestamps(&mut self, index: &[RevisionRef]) -> usize {
        let mut changed = 0;
        for rev in index {
            if let Some(entry) = self.entries.get_mut(&rev.id) {
                if entry.timestamp != rev.timestamp {
                    entry.timestamp = rev.timestamp;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Observations for the revisions in `index`, in timestamp order.
    ///
    /// Timestamps come from `index`, not from the cached entries. Revisions
    /// missing from the cache are left out; cached revisions not in `index`
    /// (deleted or suppressed since) are ignored. Equal timestamps keep
    /// index order.
    pub fn observations(&self, index: &[RevisionRef]) -> Vec<Observation> {
        let mut out: Vec<Observation> = index
            .iter()
            .filter_map(|rev| {
                self.entries.get(&rev.id).map(|entry| Observation {
                    revision_id: rev.id.clone(),
                    timestamp: rev.timestamp,
                    sentence: entry.sentence.clone(),
                })
            })
            .collect();
        out.sort_by_key(|o| o.timestamp);
        out
    }

    /// Full record for this cache plus `stats`.
    pub fn to_record(
        &self,
        stats: &[SentenceStat],
        total_revisions: usize,
        analyzed_at: DateTime<Utc>,
    ) -> AnalysisRecord {
        AnalysisRecord {
            article: self.article.clone(),
            analysis_date: Some(analyzed_at.format(ANALYSIS_DATE_FORMAT).to_string()),
            total_revisions,
            unique_sentences: stats.len(),
            cache: Some(self.entries.clone()),
            sentences: stats.iter().map(SentenceRecord::from).collect(),
        }
    }

    /// Persist the current mapping.
    ///
    /// The sentence list of the last completed run is carried along
    /// unchanged so the record stays usable if the run never finishes.
    pub async fn checkpoint_save(&self, store: &dyn CacheStore) -> Result<()> {
        let record = AnalysisRecord {
            article: self.article.clone(),
            analysis_date: Some(Utc::now().format(ANALYSIS_DATE_FORMAT).to_string()),
            total_revisions: self.entries.len(),
            unique_sentences: self.last_report.len(),
            cache: Some(self.entries.clone()),
            sentences: self.last_report.clone(),
        };
        save_record(store, &record).await?;
        debug!(entries = self.entries.len(), store = %store.describe(), "checkpoint saved");
        Ok(())
    }
}

/// `27_Club` and ` 27 Club ` name the same article (and the same record file).
fn same_article(a: &str, b: &str) -> bool {
    a.trim().replace('_', " ") == b.trim().replace('_', " ")
}

fn corrupt_report() -> LoadReport {
    LoadReport {
        corrupt: true,
        ..LoadReport::default()
    }
}

/// Serialize and write `record`.
pub async fn save_record(store: &dyn CacheStore, record: &AnalysisRecord) -> Result<()> {
    let json = record.to_json().context("Failed to serialize analysis record")?;
    store
        .write(&json)
        .await
        .with_context(|| format!("Failed to save record to {}", store.describe()))
}
