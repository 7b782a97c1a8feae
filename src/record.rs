//! On-disk layout of an analysis record.
//!
//! One JSON document per article holds the revision cache and the ranked
//! sentence statistics of the last run:
//!
//! ```json
//! {
//!   "article": "27 Club",
//!   "analysis_date": "2026-10-19 12:00:00",
//!   "total_revisions": 4321,
//!   "unique_sentences": 57,
//!   "cache": { "1234": { "timestamp": "2005-01-01T00:00:00Z", "sentence": "..." } },
//!   "sentences": [ { "sentence": "...", "total_days": 10, "total_occurrences": 2,
//!                    "periods": [ { "start_date": "2005-01-01", "end_date": "2005-01-11",
//!                                   "days": 10, "start_revision": "1234" } ] } ]
//! }
//! ```
//!
//! Older records have no `cache` section and name period bounds `start` /
//! `end`; both shapes deserialize into [`AnalysisRecord`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::{CacheEntry, Interval, SentenceStat};

/// Format of `analysis_date`.
pub const ANALYSIS_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Format of period bounds.
pub const PERIOD_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub analysis_date: Option<String>,
    #[serde(default)]
    pub total_revisions: usize,
    #[serde(default)]
    pub unique_sentences: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<BTreeMap<String, CacheEntry>>,
    #[serde(default)]
    pub sentences: Vec<SentenceRecord>,
}

impl AnalysisRecord {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// True for records written before the cache section existed.
    pub fn is_legacy(&self) -> bool {
        self.cache.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceRecord {
    pub sentence: String,
    pub total_days: i64,
    #[serde(rename = "total_occurrences", alias = "occurrence_count", default)]
    pub occurrences: usize,
    #[serde(default)]
    pub periods: Vec<PeriodRecord>,
}

impl From<&SentenceStat> for SentenceRecord {
    fn from(stat: &SentenceStat) -> Self {
        Self {
            sentence: stat.sentence.clone(),
            total_days: stat.total_days,
            occurrences: stat.occurrence_count,
            periods: stat.periods.iter().map(PeriodRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    #[serde(alias = "start")]
    pub start_date: String,
    #[serde(alias = "end")]
    pub end_date: String,
    pub days: i64,
    #[serde(
        default,
        alias = "revid",
        alias = "revision_id",
        deserialize_with = "revision_id_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_revision: Option<String>,
}

impl From<&Interval> for PeriodRecord {
    fn from(interval: &Interval) -> Self {
        Self {
            start_date: interval.start.format(PERIOD_DATE_FORMAT).to_string(),
            end_date: interval.end.format(PERIOD_DATE_FORMAT).to_string(),
            days: interval.days,
            start_revision: Some(interval.start_revision.clone()),
        }
    }
}

impl PeriodRecord {
    /// Start of the period as an instant (midnight UTC for date-only values).
    pub fn start_instant(&self) -> Option<DateTime<Utc>> {
        parse_instant(&self.start_date)
    }
}

/// Revision ids were written as numbers by some older tools.
fn revision_id_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date.
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    let date_part = text.get(..10)?;
    NaiveDate::parse_from_str(date_part, PERIOD_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
