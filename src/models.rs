//! Core data models used throughout lede.
//!
//! These types represent the revisions, cached observations, and derived
//! timeline intervals that flow through the reconstruction pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of a page's revision index.
///
/// Revision ids are opaque strings. Ordering is always by `timestamp`,
/// never by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionRef {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

impl RevisionRef {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp,
        }
    }
}

/// Cached observation for a single revision.
///
/// `sentence = None` records a soft failure: the revision was fetched (or
/// attempted) but yielded no usable sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sentence: Option<String>,
}

impl CacheEntry {
    pub fn new(timestamp: DateTime<Utc>, sentence: Option<String>) -> Self {
        Self {
            timestamp,
            sentence,
        }
    }

    pub fn is_soft_failure(&self) -> bool {
        self.sentence.is_none()
    }
}

/// A maximal run of one sentence value on the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub sentence: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Whole days covered by this interval, counted as the difference of
    /// whole-day offsets from the first observation of the timeline, not
    /// `(end - start)` truncated. A 23:00 → 01:00 interval counts 1 day when
    /// the offsets fall on different days; the days of all intervals sum to
    /// the whole-day span of the timeline.
    pub days: i64,
    /// Revision whose observation opened the interval.
    pub start_revision: String,
}

/// All intervals of one distinct sentence, with their totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceStat {
    pub sentence: String,
    pub total_days: i64,
    pub occurrence_count: usize,
    pub periods: Vec<Interval>,
}

impl SentenceStat {
    /// Earliest start across all periods.
    pub fn first_appearance(&self) -> Option<DateTime<Utc>> {
        self.periods.iter().map(|p| p.start).min()
    }
}
