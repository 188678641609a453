//! Mutable state of one workout run.
//!
//! `SessionState` is owned by `WorkoutSessionEngine` and only mutated by
//! its commands; everything else sees it through `&SessionState` or a
//! `SessionSnapshot`.

use crate::types::*;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub workout: Option<WorkoutDefinition>,
    pub current_segment_index: usize,
    /// Active seconds since start; never counts paused time
    pub elapsed_time: u32,
    pub segment_time_remaining: u32,
    pub total_pause_duration: u32,
    /// Present only while paused
    pub pause_start_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    /// One entry per exited segment, in segment order
    pub completed_segments: Vec<CompletedSegment>,
    pub pauses: Vec<PauseRecord>,
}

impl SessionState {
    /// Fresh running state positioned at the first segment
    pub(crate) fn begin(workout: WorkoutDefinition, now: DateTime<Utc>) -> Self {
        let segment_time_remaining = workout.segments.first().map_or(0, |s| s.duration);
        Self {
            status: SessionStatus::Running,
            workout: Some(workout),
            segment_time_remaining,
            start_time: Some(now),
            ..Self::default()
        }
    }

    pub fn is_workout_active(&self) -> bool {
        self.status != SessionStatus::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.status == SessionStatus::Paused
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.workout
            .as_ref()
            .and_then(|w| w.segments.get(self.current_segment_index))
    }

    pub fn is_last_segment(&self) -> bool {
        self.workout
            .as_ref()
            .is_some_and(|w| self.current_segment_index + 1 >= w.segments.len())
    }

    pub fn total_duration(&self) -> u32 {
        self.workout.as_ref().map_or(0, |w| w.total_duration())
    }

    /// Elapsed share of the planned workout, capped at 100
    pub fn progress_percent(&self) -> f64 {
        let total = self.total_duration();
        if total == 0 {
            return 0.0;
        }
        (f64::from(self.elapsed_time) / f64::from(total)).min(1.0) * 100.0
    }

    /// Active seconds spent in segments before the current one.
    ///
    /// Taken from the segment log rather than the planned durations, so a
    /// skipped segment contributes only the time actually spent in it.
    /// Without skips the two are equal.
    pub fn time_before_current_segment(&self) -> u32 {
        self.completed_segments
            .iter()
            .map(|s| s.actual_duration)
            .sum()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            workout: self.workout.clone(),
            current_segment_index: self.current_segment_index,
            current_segment: self.current_segment().cloned(),
            elapsed_time: self.elapsed_time,
            segment_time_remaining: self.segment_time_remaining,
            is_paused: self.is_paused(),
            completed_segments: self.completed_segments.clone(),
            pauses: self.pauses.clone(),
            total_pause_duration: self.total_pause_duration,
            total_duration: self.total_duration(),
            progress_percent: self.progress_percent(),
        }
    }
}
