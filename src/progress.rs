//! Analysis progress reporting.
//!
//! Reports observable progress during `lede analyze` so users see the
//! revision listing, how many revisions are left to fetch, and when a
//! checkpoint lands on disk. Progress is emitted on **stderr** so stdout
//! remains parseable for scripts.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Revision index is being listed (total unknown).
    Listing { article: String },
    /// Listing finished and was compared against the cache.
    Planned {
        article: String,
        revisions: u64,
        cached: u64,
        pending: u64,
    },
    /// Fetching: n revisions processed out of total.
    Fetching { article: String, n: u64, total: u64 },
    /// Cache persisted with this many entries.
    Checkpoint { article: String, entries: u64 },
}

/// Reports analysis progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the analysis engine.
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "analyze 27 Club  fetching  1,234 / 5,000 revisions".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Listing { article } => {
                format!("analyze {}  listing revisions...\n", article)
            }
            ProgressEvent::Planned {
                article,
                revisions,
                cached,
                pending,
            } => format!(
                "analyze {}  {} revisions, {} cached, {} to fetch\n",
                article,
                format_number(*revisions),
                format_number(*cached),
                format_number(*pending)
            ),
            ProgressEvent::Fetching { article, n, total } => format!(
                "analyze {}  fetching  {} / {} revisions\n",
                article,
                format_number(*n),
                format_number(*total)
            ),
            ProgressEvent::Checkpoint { article, entries } => format!(
                "analyze {}  checkpoint  {} cached\n",
                article,
                format_number(*entries)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Listing { article } => serde_json::json!({
                "event": "progress",
                "article": article,
                "phase": "listing"
            }),
            ProgressEvent::Planned {
                article,
                revisions,
                cached,
                pending,
            } => serde_json::json!({
                "event": "progress",
                "article": article,
                "phase": "planned",
                "revisions": revisions,
                "cached": cached,
                "pending": pending
            }),
            ProgressEvent::Fetching { article, n, total } => serde_json::json!({
                "event": "progress",
                "article": article,
                "phase": "fetching",
                "n": n,
                "total": total
            }),
            ProgressEvent::Checkpoint { article, entries } => serde_json::json!({
                "event": "progress",
                "article": article,
                "phase": "checkpoint",
                "entries": entries
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

pub(crate) fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode.
    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }
}
