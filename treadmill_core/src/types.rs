//! Core domain types for the Stride interval system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Pace types and workout segments
//! - Workout definitions (read-only engine input)
//! - Session logs (completed segments, pauses)
//! - Finished-session summaries handed to history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Workout Definition Types
// ============================================================================

/// Pace of a segment, ordered by intensity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaceType {
    Recovery,
    Base,
    Run,
    Sprint,
}

impl fmt::Display for PaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaceType::Recovery => "Recovery",
            PaceType::Base => "Base",
            PaceType::Run => "Run",
            PaceType::Sprint => "Sprint",
        };
        f.pad(label)
    }
}

/// A single interval of a workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    pub pace: PaceType,
    /// Whole seconds, always > 0 in a valid workout
    pub duration: u32,
    /// Treadmill incline in percent
    #[serde(default)]
    pub incline: f32,
}

impl Segment {
    pub fn new(pace: PaceType, duration: u32, incline: f32) -> Self {
        Self {
            pace,
            duration,
            incline,
        }
    }
}

/// A complete workout program; segment order is execution order
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDefinition {
    pub id: String,
    pub name: String,
    pub segments: Vec<Segment>,
}

impl WorkoutDefinition {
    /// Sum of all segment durations in seconds
    pub fn total_duration(&self) -> u32 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// A workout the engine can run: at least one segment, all non-empty
    pub fn is_runnable(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| s.duration > 0)
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// Discriminator of the session state machine
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

/// Log entry for a segment that was exited by timeout or skip
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletedSegment {
    pub pace: PaceType,
    pub planned_duration: u32,
    pub actual_duration: u32,
    pub skipped: bool,
}

/// One pause/resume cycle; `end_time` is `None` while the pause is open
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PauseRecord {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: u32,
}

impl PauseRecord {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// Record of a finished (or abandoned) session, handed to `SessionHistory`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinishedSessionSummary {
    pub id: Uuid,
    pub workout_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Active seconds, excluding pauses
    pub duration: u32,
    pub pause_duration: u32,
    pub completed: bool,
    pub completed_segments: Vec<CompletedSegment>,
    pub pauses: Vec<PauseRecord>,
}

impl FinishedSessionSummary {
    pub fn skipped_segments(&self) -> usize {
        self.completed_segments.iter().filter(|s| s.skipped).count()
    }
}

/// Read-only view of the engine published after every mutation
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub workout: Option<WorkoutDefinition>,
    pub current_segment_index: usize,
    pub current_segment: Option<Segment>,
    pub elapsed_time: u32,
    pub segment_time_remaining: u32,
    pub is_paused: bool,
    pub completed_segments: Vec<CompletedSegment>,
    pub pauses: Vec<PauseRecord>,
    pub total_pause_duration: u32,
    pub total_duration: u32,
    pub progress_percent: f64,
}
