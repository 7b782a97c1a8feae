//! Human-readable reports printed to stdout.

use crate::analyze::Analysis;
use crate::export::ExportRow;
use crate::record::PERIOD_DATE_FORMAT;

const RULE_WIDTH: usize = 80;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Ranked list of sentences with their periods.
pub fn print_analysis(analysis: &Analysis) {
    println!("{}", rule());
    println!("FIRST SENTENCE ANALYSIS: {}", analysis.article);
    println!("{}", rule());
    println!("Total revisions analyzed: {}", analysis.total_revisions);
    println!(
        "Fetched this run: {} ({} failed), cached: {}",
        analysis.fetched, analysis.failed, analysis.cached
    );
    if analysis.pending > 0 {
        println!("Still to fetch: {}", analysis.pending);
    }
    println!("Unique first sentences: {}", analysis.stats.len());
    println!("{}", rule());

    if analysis.stats.is_empty() {
        println!();
        println!("No sentences found.");
        return;
    }

    for (rank, stat) in analysis.stats.iter().enumerate() {
        println!();
        println!(
            "#{} - Total Days: {} | Occurrences: {}",
            rank + 1,
            stat.total_days,
            stat.occurrence_count
        );
        println!("Sentence: {}", stat.sentence);
        println!("Periods:");
        for period in &stat.periods {
            println!(
                "  • {} to {} ({} days)",
                period.start.format(PERIOD_DATE_FORMAT),
                period.end.format(PERIOD_DATE_FORMAT),
                period.days
            );
        }
    }
}

/// Distribution statistics over exported rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub first_date: String,
    pub last_date: String,
    pub average_days: f64,
    pub median_days: i64,
    pub max_days: i64,
    pub min_days: i64,
    /// Sentences active for 0 days (reverted immediately).
    pub zero_days: usize,
    pub short_lived: usize,
    /// Sentences active for 100 days or more.
    pub persistent: usize,
}

impl Summary {
    /// `None` when there are no rows.
    pub fn from_rows(rows: &[ExportRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let mut days: Vec<i64> = rows.iter().map(|r| r.total_days_active).collect();
        days.sort_unstable();

        let first_date = rows.iter().map(|r| r.first_appearance.as_str()).min()?;
        let last_date = rows.iter().map(|r| r.first_appearance.as_str()).max()?;

        Some(Self {
            total: rows.len(),
            first_date: first_date.to_string(),
            last_date: last_date.to_string(),
            average_days: days.iter().sum::<i64>() as f64 / days.len() as f64,
            median_days: days[days.len() / 2],
            max_days: days[days.len() - 1],
            min_days: days[0],
            zero_days: days.iter().filter(|d| **d == 0).count(),
            short_lived: days.iter().filter(|d| (1..100).contains(*d)).count(),
            persistent: days.iter().filter(|d| **d >= 100).count(),
        })
    }

    fn percent(&self, n: usize) -> f64 {
        n as f64 * 100.0 / self.total as f64
    }
}

pub fn print_summary(rows: &[ExportRow]) {
    println!("{}", rule());
    println!("CSV EXPORT SUMMARY");
    println!("{}", rule());

    let Some(s) = Summary::from_rows(rows) else {
        println!("No sentences found.");
        println!("{}", rule());
        return;
    };

    println!("Total sentences: {}", s.total);
    println!("Date range: {} to {}", s.first_date, s.last_date);
    println!();
    println!("Days active:");
    println!("  Average: {:.1} days", s.average_days);
    println!("  Median: {} days", s.median_days);
    println!("  Max: {} days", s.max_days);
    println!("  Min: {} days", s.min_days);
    println!();
    println!("Distribution:");
    println!(
        "  0 days (immediately reverted): {} ({:.0}%)",
        s.zero_days,
        s.percent(s.zero_days)
    );
    println!(
        "  1-99 days: {} ({:.0}%)",
        s.short_lived,
        s.percent(s.short_lived)
    );
    println!(
        "  100+ days (persistent): {} ({:.0}%)",
        s.persistent,
        s.percent(s.persistent)
    );
    println!("{}", rule());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, days: i64) -> ExportRow {
        ExportRow {
            first_appearance: date.to_string(),
            total_days_active: days,
            num_periods: 1,
            sentence: format!("s{}", days),
        }
    }

    #[test]
    fn summary_of_nothing_is_none() {
        assert!(Summary::from_rows(&[]).is_none());
    }

    #[test]
    fn summary_buckets_and_median() {
        let rows = vec![
            row("2010-01-01", 0),
            row("2011-01-01", 5),
            row("2009-06-01", 250),
            row("2012-01-01", 0),
        ];
        let s = Summary::from_rows(&rows).unwrap();
        assert_eq!(s.total, 4);
        assert_eq!(s.first_date, "2009-06-01");
        assert_eq!(s.last_date, "2012-01-01");
        assert_eq!(s.median_days, 5);
        assert_eq!((s.min_days, s.max_days), (0, 250));
        assert_eq!((s.zero_days, s.short_lived, s.persistent), (2, 1, 1));
        assert!((s.average_days - 63.75).abs() < 1e-9);
        assert!((s.percent(s.zero_days) - 50.0).abs() < 1e-9);
    }
}
