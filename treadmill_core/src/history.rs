//! Finished-session history.
//!
//! Summaries are appended to a JSONL (JSON Lines) file under an exclusive
//! file lock. Older summaries may have been rolled up into a CSV archive;
//! `load_recent_summaries` reads both.

use crate::rollup::SummaryRow;
use crate::{Error, FinishedSessionSummary, Result};
use chrono::{Duration, Utc};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Destination for finished-session summaries
pub trait SessionHistory {
    fn record(&mut self, summary: &FinishedSessionSummary) -> Result<()>;
}

/// JSONL-based history with file locking
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionHistory for JsonlHistory {
    fn record(&mut self, summary: &FinishedSessionSummary) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(summary)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended session {} to history", summary.id);
        Ok(())
    }
}

/// In-memory history; clones share the same log.
///
/// `failing()` builds one whose `record` always errors, for exercising
/// the persistence-failure path.
#[derive(Clone, Debug, Default)]
pub struct MemoryHistory {
    records: Arc<Mutex<Vec<FinishedSessionSummary>>>,
    fail: bool,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<FinishedSessionSummary> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionHistory for MemoryHistory {
    fn record(&mut self, summary: &FinishedSessionSummary) -> Result<()> {
        if self.fail {
            return Err(Error::Persistence("history store unavailable".into()));
        }
        self.records
            .lock()
            .map_err(|_| Error::Persistence("history lock poisoned".into()))?
            .push(summary.clone());
        Ok(())
    }
}

/// Read all summaries from a JSONL history file
///
/// Corrupt lines are logged and skipped.
pub fn read_summaries(path: &Path) -> Result<Vec<FinishedSessionSummary>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut summaries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<FinishedSessionSummary>(&line) {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                tracing::warn!("Failed to parse summary at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} summaries from history", summaries.len());
    Ok(summaries)
}

/// Load summaries from the last N days from both JSONL and CSV
///
/// Sorted by start time, newest first; a session present in both files is
/// returned once.
pub fn load_recent_summaries(
    jsonl_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<FinishedSessionSummary>> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut summaries = Vec::new();
    let mut seen_ids = HashSet::new();

    for summary in read_summaries(jsonl_path)? {
        if summary.start_time >= cutoff && seen_ids.insert(summary.id) {
            summaries.push(summary);
        }
    }
    tracing::debug!("Loaded {} summaries from JSONL", summaries.len());

    if csv_path.exists() {
        let mut csv_count = 0;
        for summary in load_summaries_from_csv(csv_path)? {
            if summary.start_time >= cutoff && seen_ids.insert(summary.id) {
                summaries.push(summary);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} summaries from CSV", csv_count);
    }

    summaries.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    tracing::info!(
        "Loaded {} total sessions from last {} days",
        summaries.len(),
        days
    );

    Ok(summaries)
}

fn load_summaries_from_csv(path: &Path) -> Result<Vec<FinishedSessionSummary>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut summaries = Vec::new();
    for result in reader.deserialize::<SummaryRow>() {
        match result.map_err(Error::from).and_then(FinishedSessionSummary::try_from) {
            Ok(summary) => summaries.push(summary),
            Err(e) => tracing::warn!("Skipping CSV row: {}", e),
        }
    }

    Ok(summaries)
}
