//! Timeline reconstruction.
//!
//! Turns per-revision sentence observations into contiguous intervals, one
//! per maximal run of an identical sentence:
//!
//! ```text
//! t1:A  t2:A  t3:-  t4:B  t5:A            now
//!  ├───────── A ──────┼─ B ─┼──── A ───────┤
//! ```
//!
//! Observations without a sentence (soft failures) are skipped entirely;
//! the surrounding known observations are compared directly. The last
//! interval stays open until `now`.
//!
//! Day counts are whole-day offsets from the first observation, so the
//! days of all intervals always sum to the whole days between the first
//! observation and `now`.

use chrono::{DateTime, Utc};

use crate::models::Interval;

const SECONDS_PER_DAY: i64 = 86_400;

/// One revision's sentence at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub revision_id: String,
    pub timestamp: DateTime<Utc>,
    pub sentence: Option<String>,
}

impl Observation {
    pub fn new(
        revision_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        sentence: Option<&str>,
    ) -> Self {
        Self {
            revision_id: revision_id.into(),
            timestamp,
            sentence: sentence.map(str::to_string),
        }
    }
}

struct OpenInterval<'a> {
    sentence: &'a str,
    start: DateTime<Utc>,
    revision: &'a str,
}

/// Whole days from `origin` to `t`.
fn day_offset(origin: DateTime<Utc>, t: DateTime<Utc>) -> i64 {
    (t - origin).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn close(open: OpenInterval<'_>, end: DateTime<Utc>, origin: DateTime<Utc>) -> Interval {
    Interval {
        sentence: open.sentence.to_string(),
        start: open.start,
        end,
        days: day_offset(origin, end) - day_offset(origin, open.start),
        start_revision: open.revision.to_string(),
    }
}

/// Build the interval sequence for `observations`.
///
/// Observations are ordered by timestamp; equal timestamps keep their input
/// order. Returns an empty vector when no observation carries a sentence.
/// A `now` earlier than the last observation is treated as that
/// observation's timestamp.
pub fn reconstruct(observations: &[Observation], now: DateTime<Utc>) -> Vec<Interval> {
    let mut known: Vec<(&Observation, &str)> = observations
        .iter()
        .filter_map(|o| o.sentence.as_deref().map(|s| (o, s)))
        .collect();
    known.sort_by_key(|(o, _)| o.timestamp);

    let (origin, last) = match (known.first(), known.last()) {
        (Some((first, _)), Some((last, _))) => (first.timestamp, last.timestamp),
        _ => return Vec::new(),
    };
    let now = now.max(last);

    let mut intervals = Vec::new();
    let mut open: Option<OpenInterval<'_>> = None;

    for (obs, sentence) in known {
        if matches!(&open, Some(cur) if cur.sentence == sentence) {
            continue;
        }
        if let Some(cur) = open.take() {
            intervals.push(close(cur, obs.timestamp, origin));
        }
        open = Some(OpenInterval {
            sentence,
            start: obs.timestamp,
            revision: &obs.revision_id,
        });
    }

    if let Some(cur) = open {
        intervals.push(close(cur, now, origin));
    }

    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn obs(id: &str, at: DateTime<Utc>, sentence: Option<&str>) -> Observation {
        Observation::new(id, at, sentence)
    }

    #[test]
    fn no_sentences_no_intervals() {
        assert!(reconstruct(&[], day(5)).is_empty());
        let only_failures = vec![obs("1", day(0), None), obs("2", day(1), None)];
        assert!(reconstruct(&only_failures, day(5)).is_empty());
    }

    #[test]
    fn single_sentence_spans_everything() {
        let input = vec![
            obs("1", day(0), Some("A")),
            obs("2", day(3), Some("A")),
            obs("3", day(7), Some("A")),
        ];
        let out = reconstruct(&input, day(10));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start, day(0));
        assert_eq!(out[0].end, day(10));
        assert_eq!(out[0].days, 10);
        assert_eq!(out[0].start_revision, "1");
    }

    #[test]
    fn change_closes_interval_at_next_observation() {
        let input = vec![
            obs("1", day(0), Some("A")),
            obs("2", day(2), Some("A")),
            obs("3", day(5), Some("B")),
        ];
        let out = reconstruct(&input, day(9));
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].sentence.as_str(), out[0].start, out[0].end), ("A", day(0), day(5)));
        assert_eq!(out[0].days, 5);
        assert_eq!((out[1].sentence.as_str(), out[1].start, out[1].end), ("B", day(5), day(9)));
        assert_eq!(out[1].days, 4);
        assert_eq!(out[1].start_revision, "3");
    }

    #[test]
    fn recurring_sentence_gets_separate_intervals() {
        let input = vec![
            obs("1", day(0), Some("A")),
            obs("2", day(4), Some("B")),
            obs("3", day(6), Some("A")),
        ];
        let out = reconstruct(&input, day(10));
        let sentences: Vec<_> = out.iter().map(|i| i.sentence.as_str()).collect();
        assert_eq!(sentences, vec!["A", "B", "A"]);
        assert_eq!(out.iter().map(|i| i.days).collect::<Vec<_>>(), vec![4, 2, 4]);
    }

    #[test]
    fn soft_failure_between_equal_sentences_is_skipped() {
        let input = vec![
            obs("1", day(0), Some("A")),
            obs("2", day(3), None),
            obs("3", day(6), Some("A")),
        ];
        let out = reconstruct(&input, day(8));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].days, 8);
    }

    #[test]
    fn soft_failure_does_not_end_interval() {
        let input = vec![
            obs("1", day(0), Some("A")),
            obs("2", day(3), None),
            obs("3", day(6), Some("B")),
        ];
        let out = reconstruct(&input, day(8));
        assert_eq!(out[0].end, day(6));
        assert_eq!(out[1].start, day(6));
    }

    #[test]
    fn unordered_input_is_sorted_and_ties_keep_input_order() {
        let input = vec![
            obs("3", day(5), Some("C")),
            obs("1", day(0), Some("A")),
            obs("2a", day(2), Some("B")),
            obs("2b", day(2), Some("A")),
        ];
        let out = reconstruct(&input, day(6));
        let seq: Vec<_> = out.iter().map(|i| i.sentence.as_str()).collect();
        assert_eq!(seq, vec!["A", "B", "A", "C"]);
        // the tie produces a zero-length B interval
        assert_eq!(out[1].start, out[1].end);
        assert_eq!(out[1].days, 0);
    }

    #[test]
    fn intervals_are_contiguous_and_cover_to_now() {
        let base = day(0);
        let input: Vec<_> = [
            (0, "A"),
            (37_000, "B"),
            (90_000, "B"),
            (200_000, "A"),
            (200_500, "C"),
            (1_000_000, "A"),
        ]
        .iter()
        .enumerate()
        .map(|(i, (secs, s))| obs(&i.to_string(), base + Duration::seconds(*secs), Some(*s)))
        .collect();
        let now = base + Duration::seconds(1_234_567);

        let out = reconstruct(&input, now);
        for pair in out.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(out.last().unwrap().end, now);
        let total: i64 = out.iter().map(|i| i.days).sum();
        assert_eq!(total, (now - out[0].start).num_days());
    }

    #[test]
    fn now_before_last_observation_is_clamped() {
        let input = vec![obs("1", day(0), Some("A")), obs("2", day(5), Some("B"))];
        let out = reconstruct(&input, day(3));
        assert_eq!(out[1].end, day(5));
        assert_eq!(out[1].days, 0);
    }

    #[test]
    fn days_count_offset_boundaries_not_elapsed_time() {
        let input = vec![
            obs("1", day(0), Some("A")),
            obs("2", day(0) + Duration::hours(23), Some("B")),
            obs("3", day(1) + Duration::hours(1), Some("C")),
        ];
        let out = reconstruct(&input, day(1) + Duration::hours(2));
        // two hours elapsed, but the interval crosses a day boundary
        assert_eq!(out[1].sentence, "B");
        assert_eq!(out[1].days, 1);
        assert_eq!(out.iter().map(|i| i.days).sum::<i64>(), 1);
    }
}
