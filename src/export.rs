//! Export a saved analysis record as a chronological CSV.
//!
//! One row per distinct sentence, ordered by the date it first became the
//! opening sentence:
//!
//! ```text
//! first_appearance,total_days_active,num_periods,sentence
//! 2004-03-01,12,1,"The 27 Club is a term used to refer to musicians, ..."
//! ```

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::record::AnalysisRecord;

pub const CSV_HEADER: [&str; 4] = [
    "first_appearance",
    "total_days_active",
    "num_periods",
    "sentence",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub first_appearance: String,
    pub total_days_active: i64,
    pub num_periods: usize,
    pub sentence: String,
}

/// Rows for every sentence that has at least one period, earliest first.
pub fn chronological_rows(record: &AnalysisRecord) -> Vec<ExportRow> {
    let mut rows: Vec<ExportRow> = record
        .sentences
        .iter()
        .filter_map(|s| {
            let first = s.periods.iter().map(|p| p.start_date.as_str()).min()?;
            Some(ExportRow {
                first_appearance: first.to_string(),
                total_days_active: s.total_days,
                num_periods: s.occurrences,
                sentence: s.sentence.clone(),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.first_appearance.cmp(&b.first_appearance));
    rows
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write `rows` as CSV with a header line.
pub fn write_csv<W: Write>(mut out: W, rows: &[ExportRow]) -> std::io::Result<()> {
    writeln!(out, "{}", CSV_HEADER.join(","))?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{}",
            csv_field(&row.first_appearance),
            row.total_days_active,
            row.num_periods,
            csv_field(&row.sentence)
        )?;
    }
    out.flush()
}

/// Read and parse a saved record.
pub fn read_record(path: &Path) -> Result<AnalysisRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    AnalysisRecord::from_json(&text)
        .with_context(|| format!("Failed to parse analysis record {}", path.display()))
}

/// `27_Club_first_sentence_analysis.json` → `27_Club_first_sentence_analysis_chronological.csv`.
pub fn default_csv_path(record_path: &Path) -> PathBuf {
    let stem = record_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "analysis".to_string());
    record_path.with_file_name(format!("{}_chronological.csv", stem))
}

/// CLI entry point for `lede export`. Returns the rows written.
pub fn run_export(record_path: &Path, output: Option<&Path>) -> Result<Vec<ExportRow>> {
    let record = read_record(record_path)?;
    let rows = chronological_rows(&record);
    let out_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_csv_path(record_path));

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(&out_path)
        .with_context(|| format!("Failed to create {}", out_path.display()))?;
    write_csv(std::io::BufWriter::new(file), &rows)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    eprintln!("Exported {} sentences to {}", rows.len(), out_path.display());
    Ok(rows)
}
