//! CSV rollup for archiving JSONL history.
//!
//! The CSV archive keeps one row per session; segment and pause logs stay
//! in the JSONL files and are not carried over.

use crate::{Error, FinishedSessionSummary, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SummaryRow {
    id: String,
    workout_id: String,
    start_time: String,
    end_time: String,
    duration: u32,
    pause_duration: u32,
    completed: bool,
    segments_finished: usize,
    segments_skipped: usize,
    pause_count: usize,
}

impl From<&FinishedSessionSummary> for SummaryRow {
    fn from(summary: &FinishedSessionSummary) -> Self {
        SummaryRow {
            id: summary.id.to_string(),
            workout_id: summary.workout_id.clone(),
            start_time: summary.start_time.to_rfc3339(),
            end_time: summary.end_time.to_rfc3339(),
            duration: summary.duration,
            pause_duration: summary.pause_duration,
            completed: summary.completed,
            segments_finished: summary.completed_segments.len(),
            segments_skipped: summary.skipped_segments(),
            pause_count: summary.pauses.len(),
        }
    }
}

impl TryFrom<SummaryRow> for FinishedSessionSummary {
    type Error = Error;

    fn try_from(row: SummaryRow) -> Result<Self> {
        let id =
            Uuid::parse_str(&row.id).map_err(|e| Error::Other(format!("Invalid UUID: {}", e)))?;

        let parse = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::Other(format!("Invalid date: {}", e)))
        };

        Ok(FinishedSessionSummary {
            id,
            workout_id: row.workout_id,
            start_time: parse(&row.start_time)?,
            end_time: parse(&row.end_time)?,
            duration: row.duration,
            pause_duration: row.pause_duration,
            completed: row.completed,
            completed_segments: vec![], // Not stored in CSV
            pauses: vec![],
        })
    }
}

/// Roll up JSONL history into CSV and archive the JSONL file
///
/// 1. Reads all summaries from the JSONL file
/// 2. Appends them to the CSV file (headers only when the file is new)
/// 3. Syncs the CSV to disk
/// 4. Renames the JSONL file to `.jsonl.processed`
///
/// Returns the number of summaries processed. The JSONL file is renamed,
/// not deleted, so it can be recovered by hand.
pub fn history_to_csv_and_archive(jsonl_path: &Path, csv_path: &Path) -> Result<usize> {
    let summaries = crate::history::read_summaries(jsonl_path)?;

    if summaries.is_empty() {
        tracing::info!("No sessions in history to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for summary in &summaries {
        writer.serialize(SummaryRow::from(summary))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions to CSV", summaries.len());

    let processed_path = jsonl_path.with_extension("jsonl.processed");
    std::fs::rename(jsonl_path, &processed_path)?;

    tracing::info!("Archived history to {:?}", processed_path);

    Ok(summaries.len())
}

/// Remove all `.processed` history files in `dir`
pub fn cleanup_processed(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed history: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed history files", count);
    }

    Ok(count)
}
