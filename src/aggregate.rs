//! Per-sentence aggregation of timeline intervals.
//!
//! Groups intervals by exact sentence text and ranks the groups by total
//! active days, then by number of separate periods. Remaining ties keep the
//! order in which sentences first appeared on the timeline.

use std::collections::HashMap;

use crate::models::{Interval, SentenceStat};

/// Group and rank `intervals` (expected in timeline order).
pub fn aggregate(intervals: Vec<Interval>) -> Vec<SentenceStat> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut stats: Vec<SentenceStat> = Vec::new();

    for interval in intervals {
        match index.get(&interval.sentence) {
            Some(&i) => {
                let stat = &mut stats[i];
                stat.total_days += interval.days;
                stat.occurrence_count += 1;
                stat.periods.push(interval);
            }
            None => {
                index.insert(interval.sentence.clone(), stats.len());
                stats.push(SentenceStat {
                    sentence: interval.sentence.clone(),
                    total_days: interval.days,
                    occurrence_count: 1,
                    periods: vec![interval],
                });
            }
        }
    }

    // stable: equal keys keep first-appearance order
    stats.sort_by(|a, b| {
        b.total_days
            .cmp(&a.total_days)
            .then_with(|| b.occurrence_count.cmp(&a.occurrence_count))
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{reconstruct, Observation};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn interval(sentence: &str, start: i64, end: i64) -> Interval {
        Interval {
            sentence: sentence.to_string(),
            start: day(start),
            end: day(end),
            days: end - start,
            start_revision: format!("r{}", start),
        }
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn non_contiguous_runs_are_combined() {
        let stats = aggregate(vec![
            interval("A", 0, 3),
            interval("B", 3, 5),
            interval("A", 5, 12),
        ]);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].sentence, "A");
        assert_eq!(stats[0].occurrence_count, 2);
        assert_eq!(stats[0].total_days, 10);
        assert_eq!(stats[0].periods.len(), 2);
        assert_eq!(stats[0].periods[1].start, day(5));
        assert_eq!(stats[1].sentence, "B");
        assert_eq!(stats[1].total_days, 2);
    }

    #[test]
    fn ties_break_on_occurrences_then_first_appearance() {
        let stats = aggregate(vec![
            interval("first", 0, 4),
            interval("split", 4, 6),
            interval("late", 6, 10),
            interval("split", 10, 12),
        ]);
        let order: Vec<_> = stats.iter().map(|s| s.sentence.as_str()).collect();
        assert_eq!(order, vec!["split", "first", "late"]);
    }

    #[test]
    fn grouping_is_exact_text() {
        let stats = aggregate(vec![interval("A.", 0, 1), interval("a.", 1, 2)]);
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn totals_match_timeline_span() {
        let obs = vec![
            Observation::new("1", day(0), Some("A")),
            Observation::new("2", day(2), Some("B")),
            Observation::new("3", day(3), None),
            Observation::new("4", day(9), Some("A")),
        ];
        let now = day(20) + Duration::hours(5);
        let stats = aggregate(reconstruct(&obs, now));
        let a = stats.iter().find(|s| s.sentence == "A").unwrap();
        assert_eq!(a.occurrence_count, 2);
        assert_eq!(a.total_days, 2 + 11);
        let total: i64 = stats.iter().map(|s| s.total_days).sum();
        assert_eq!(total, (now - day(0)).num_days());
    }
}
