//! Workout session engine.
//!
//! A small state machine driven by a once-per-second tick:
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!        Completed -> (end) -> Idle
//! ```
//!
//! Commands issued in a state where they are undefined are ignored and
//! return `false`. Completion is only ever detected from a running tick.

use crate::catalog::WorkoutCatalog;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::heartbeat::Heartbeat;
use crate::history::SessionHistory;
use crate::session::SessionState;
use crate::{CompletedSegment, Error, FinishedSessionSummary, PauseRecord, Result};
use crate::{SessionSnapshot, SessionStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Timing knobs of the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    pub tick_interval: Duration,
    pub skip_debounce: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            skip_debounce: Duration::from_millis(config.skip_debounce_ms),
        }
    }
}

/// Result of `end()`: the summary plus whether history accepted it
#[derive(Debug)]
pub struct EndOutcome {
    pub summary: FinishedSessionSummary,
    pub recorded: Result<()>,
}

pub struct WorkoutSessionEngine {
    catalog: Box<dyn WorkoutCatalog>,
    history: Box<dyn SessionHistory>,
    heartbeat: Box<dyn Heartbeat>,
    clock: Box<dyn Clock>,
    settings: EngineSettings,
    state: SessionState,
    armed_generation: Option<u64>,
    last_skip_at: Option<DateTime<Utc>>,
}

impl WorkoutSessionEngine {
    pub fn new(
        catalog: impl WorkoutCatalog + 'static,
        history: impl SessionHistory + 'static,
        heartbeat: impl Heartbeat + 'static,
    ) -> Self {
        Self {
            catalog: Box::new(catalog),
            history: Box::new(history),
            heartbeat: Box::new(heartbeat),
            clock: Box::new(SystemClock),
            settings: EngineSettings::default(),
            state: SessionState::default(),
            armed_generation: None,
            last_skip_at: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn is_workout_active(&self) -> bool {
        self.state.is_workout_active()
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }

    pub fn total_duration(&self) -> u32 {
        self.state.total_duration()
    }

    pub fn progress_percent(&self) -> f64 {
        self.state.progress_percent()
    }

    /// Load a workout and start running it from the first segment.
    ///
    /// Any previous session is discarded and its timer cancelled. On
    /// `WorkoutNotFound` nothing changes.
    pub fn start(&mut self, workout_id: &str) -> Result<()> {
        let workout = self
            .catalog
            .get_workout_by_id(workout_id)
            .filter(|w| w.is_runnable())
            .ok_or_else(|| {
                tracing::warn!("Cannot start unknown or empty workout '{}'", workout_id);
                Error::WorkoutNotFound(workout_id.to_string())
            })?;

        if self.state.is_workout_active() {
            tracing::warn!(
                "Restarting: discarding active session of '{}'",
                self.state.workout.as_ref().map_or("", |w| w.id.as_str())
            );
        }

        self.cancel_timer();
        self.last_skip_at = None;
        self.state = SessionState::begin(workout, self.clock.now());
        self.armed_generation = Some(self.heartbeat.arm(self.settings.tick_interval));

        tracing::info!(
            "Started workout '{}' ({} segments, {}s)",
            workout_id,
            self.state.workout.as_ref().map_or(0, |w| w.segments.len()),
            self.state.total_duration()
        );
        Ok(())
    }

    /// Entry point for heartbeat ticks; drops ticks from cancelled timers
    pub fn on_timer(&mut self, generation: u64) -> bool {
        if self.armed_generation != Some(generation) {
            tracing::trace!("Ignoring stale tick from timer generation {}", generation);
            return false;
        }
        self.tick()
    }

    /// Advance the session by one second.
    ///
    /// Crosses at most one segment boundary per call.
    pub fn tick(&mut self) -> bool {
        if self.state.status != SessionStatus::Running {
            tracing::trace!("Tick ignored in {:?}", self.state.status);
            return false;
        }
        let Some(segment) = self.state.current_segment().cloned() else {
            return false;
        };

        self.state.elapsed_time += 1;

        let segment_elapsed = self
            .state
            .elapsed_time
            .saturating_sub(self.state.time_before_current_segment());
        self.state.segment_time_remaining = segment.duration.saturating_sub(segment_elapsed);

        if self.state.segment_time_remaining == 0 {
            self.state.completed_segments.push(CompletedSegment {
                pace: segment.pace,
                planned_duration: segment.duration,
                actual_duration: segment.duration,
                skipped: false,
            });
            self.advance_segment();
        }
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state.status != SessionStatus::Running {
            tracing::debug!("Pause ignored in {:?}", self.state.status);
            return false;
        }
        let now = self.clock.now();
        self.state.status = SessionStatus::Paused;
        self.state.pause_start_time = Some(now);
        self.state.pauses.push(PauseRecord {
            start_time: now,
            end_time: None,
            duration: 0,
        });
        tracing::info!("Paused at {}s", self.state.elapsed_time);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state.status != SessionStatus::Paused {
            tracing::debug!("Resume ignored in {:?}", self.state.status);
            return false;
        }
        let paused_for = self.close_open_pause();
        self.state.status = SessionStatus::Running;
        tracing::info!("Resumed after {}s pause", paused_for);
        true
    }

    /// Leave the current segment early.
    ///
    /// Only defined while running. Repeated calls inside the debounce window
    /// are dropped so one user action never advances more than one segment.
    pub fn skip(&mut self) -> bool {
        if self.state.status != SessionStatus::Running {
            tracing::debug!("Skip ignored in {:?}", self.state.status);
            return false;
        }

        let now = self.clock.now();
        if let Some(last) = self.last_skip_at {
            // A clock that stepped backwards puts the previous skip outside the window
            if let Ok(since) = (now - last).to_std() {
                if since < self.settings.skip_debounce {
                    tracing::warn!("Skip debounced ({:?} since previous skip)", since);
                    return false;
                }
            }
        }
        let Some(segment) = self.state.current_segment().cloned() else {
            return false;
        };
        self.last_skip_at = Some(now);

        let actual_duration = segment
            .duration
            .saturating_sub(self.state.segment_time_remaining);
        self.state.completed_segments.push(CompletedSegment {
            pace: segment.pace,
            planned_duration: segment.duration,
            actual_duration,
            skipped: true,
        });
        tracing::info!(
            "Skipped segment {} after {}s of {}s",
            self.state.current_segment_index,
            actual_duration,
            segment.duration
        );
        self.advance_segment();
        true
    }

    /// Finish the session and hand its summary to history.
    ///
    /// Returns `None` when idle. The timer is cancelled before anything
    /// else, and the state is back to `Idle` even if recording fails.
    pub fn end(&mut self, mark_completed: bool) -> Option<EndOutcome> {
        self.cancel_timer();

        if !self.state.is_workout_active() {
            tracing::debug!("End ignored: no active session");
            return None;
        }

        if self.state.is_paused() {
            self.close_open_pause();
        }

        let now = self.clock.now();
        let finished = std::mem::take(&mut self.state);
        self.last_skip_at = None;

        let summary = FinishedSessionSummary {
            id: Uuid::new_v4(),
            workout_id: finished.workout.map(|w| w.id).unwrap_or_default(),
            start_time: finished.start_time.unwrap_or(now),
            end_time: now,
            duration: finished.elapsed_time,
            pause_duration: finished.total_pause_duration,
            completed: mark_completed || finished.status == SessionStatus::Completed,
            completed_segments: finished.completed_segments,
            pauses: finished.pauses,
        };

        let recorded = self.history.record(&summary).map_err(|e| {
            tracing::error!("Failed to record session {}: {}", summary.id, e);
            match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            }
        });

        tracing::info!(
            "Ended workout '{}' after {}s ({} segments logged, completed: {})",
            summary.workout_id,
            summary.duration,
            summary.completed_segments.len(),
            summary.completed
        );

        Some(EndOutcome { summary, recorded })
    }

    /// Move past the segment just logged, or complete on the last one
    fn advance_segment(&mut self) {
        if self.state.is_last_segment() {
            self.state.segment_time_remaining = 0;
            self.state.status = SessionStatus::Completed;
            self.cancel_timer();
            tracing::info!("Workout completed at {}s", self.state.elapsed_time);
            return;
        }

        self.state.current_segment_index += 1;
        self.state.segment_time_remaining = self.state.current_segment().map_or(0, |s| s.duration);
        tracing::debug!(
            "Entered segment {} at {}s",
            self.state.current_segment_index,
            self.state.elapsed_time
        );
    }

    /// Close the open pause record; returns its length in whole seconds
    fn close_open_pause(&mut self) -> u32 {
        let now = self.clock.now();
        let started = self.state.pause_start_time.take().unwrap_or(now);
        let paused_for = u32::try_from((now - started).num_milliseconds().max(0) / 1000)
            .unwrap_or(u32::MAX);

        self.state.total_pause_duration = self.state.total_pause_duration.saturating_add(paused_for);
        if let Some(record) = self.state.pauses.last_mut().filter(|p| p.is_open()) {
            record.end_time = Some(now);
            record.duration = paused_for;
        }
        paused_for
    }

    fn cancel_timer(&mut self) {
        if self.armed_generation.take().is_some() {
            self.heartbeat.disarm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::clock::ManualClock;
    use crate::heartbeat::ManualHeartbeat;
    use crate::history::MemoryHistory;
    use crate::{PaceType, Segment, WorkoutDefinition};

    struct Harness {
        engine: WorkoutSessionEngine,
        clock: ManualClock,
        heartbeat: ManualHeartbeat,
        history: MemoryHistory,
    }

    fn workout(id: &str, segments: &[(PaceType, u32)]) -> WorkoutDefinition {
        WorkoutDefinition {
            id: id.into(),
            name: id.to_uppercase(),
            segments: segments
                .iter()
                .map(|(pace, duration)| Segment::new(*pace, *duration, 1.0))
                .collect(),
        }
    }

    fn test_catalog() -> InMemoryCatalog {
        InMemoryCatalog::from_workouts([
            workout("two", &[(PaceType::Run, 60), (PaceType::Recovery, 30)]),
            workout(
                "three",
                &[(PaceType::Base, 60), (PaceType::Sprint, 90), (PaceType::Recovery, 30)],
            ),
            workout("single", &[(PaceType::Sprint, 3)]),
            workout("empty", &[]),
        ])
    }

    fn harness_with(history: MemoryHistory) -> Harness {
        crate::logging::init_test();
        let clock = ManualClock::default();
        let heartbeat = ManualHeartbeat::new();
        let engine = WorkoutSessionEngine::new(test_catalog(), history.clone(), heartbeat.clone())
            .with_clock(clock.clone());
        Harness {
            engine,
            clock,
            heartbeat,
            history,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryHistory::new())
    }

    fn started(id: &str) -> Harness {
        let mut h = harness();
        h.engine.start(id).unwrap();
        h
    }

    fn ticks(engine: &mut WorkoutSessionEngine, n: u32) {
        for _ in 0..n {
            engine.tick();
        }
    }

    #[test]
    fn test_start_resets_state_and_arms_timer() {
        let h = started("two");
        let state = h.engine.state();

        assert_eq!(state.status, SessionStatus::Running);
        assert_eq!(state.current_segment_index, 0);
        assert_eq!(state.elapsed_time, 0);
        assert_eq!(state.segment_time_remaining, 60);
        assert!(state.completed_segments.is_empty());
        assert!(state.pauses.is_empty());

        let timer = h.heartbeat.state();
        assert!(timer.armed);
        assert_eq!(timer.period, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_start_unknown_workout_leaves_idle() {
        let mut h = harness();
        let err = h.engine.start("missing").unwrap_err();
        assert!(matches!(err, Error::WorkoutNotFound(id) if id == "missing"));
        assert_eq!(h.engine.state(), &SessionState::default());
        assert!(!h.heartbeat.state().armed);
    }

    #[test]
    fn test_start_empty_workout_is_not_found() {
        let mut h = harness();
        assert!(matches!(h.engine.start("empty"), Err(Error::WorkoutNotFound(_))));
        assert_eq!(h.engine.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_failed_start_does_not_disturb_running_session() {
        let mut h = started("two");
        ticks(&mut h.engine, 5);

        assert!(h.engine.start("missing").is_err());
        assert_eq!(h.engine.state().elapsed_time, 5);
        assert_eq!(h.engine.status(), SessionStatus::Running);
    }

    #[test]
    fn test_restart_replaces_timer() {
        let mut h = started("two");
        let first = h.heartbeat.generation();
        ticks(&mut h.engine, 10);

        h.engine.start("three").unwrap();
        let second = h.heartbeat.generation();

        assert_ne!(first, second);
        assert_eq!(h.heartbeat.state().arm_count, 2);
        assert_eq!(h.engine.state().elapsed_time, 0);

        // Tick queued by the old timer must not count
        assert!(!h.engine.on_timer(first));
        assert_eq!(h.engine.state().elapsed_time, 0);
        assert!(h.engine.on_timer(second));
        assert_eq!(h.engine.state().elapsed_time, 1);
    }

    #[test]
    fn test_elapsed_increases_by_one_per_tick() {
        let mut h = started("three");
        let mut previous = 0;
        for _ in 0..179 {
            assert!(h.engine.tick());
            let elapsed = h.engine.state().elapsed_time;
            assert_eq!(elapsed, previous + 1);
            previous = elapsed;
        }
    }

    #[test]
    fn test_segment_boundary_exactness() {
        let mut h = started("two");

        ticks(&mut h.engine, 59);
        assert_eq!(h.engine.state().current_segment_index, 0);
        assert_eq!(h.engine.state().segment_time_remaining, 1);

        h.engine.tick();
        assert_eq!(h.engine.state().current_segment_index, 1);
        assert_eq!(h.engine.state().segment_time_remaining, 30);
    }

    #[test]
    fn test_completion_after_total_duration() {
        let mut h = started("two");

        ticks(&mut h.engine, 89);
        assert_eq!(h.engine.status(), SessionStatus::Running);

        h.engine.tick();
        assert_eq!(h.engine.status(), SessionStatus::Completed);
        assert!(!h.heartbeat.state().armed);

        let before = h.engine.state().clone();
        for _ in 0..5 {
            assert!(!h.engine.tick());
        }
        assert_eq!(h.engine.state(), &before);
        assert_eq!(h.engine.state().current_segment_index, 1);
        assert_eq!(h.engine.state().segment_time_remaining, 0);
        assert_eq!(h.engine.progress_percent(), 100.0);
    }

    #[test]
    fn test_completed_segments_order_and_content() {
        let mut h = started("two");
        ticks(&mut h.engine, 90);

        assert_eq!(
            h.engine.state().completed_segments,
            vec![
                CompletedSegment {
                    pace: PaceType::Run,
                    planned_duration: 60,
                    actual_duration: 60,
                    skipped: false,
                },
                CompletedSegment {
                    pace: PaceType::Recovery,
                    planned_duration: 30,
                    actual_duration: 30,
                    skipped: false,
                },
            ]
        );
    }

    #[test]
    fn test_ticks_while_paused_change_nothing() {
        let mut h = started("two");
        ticks(&mut h.engine, 7);
        assert!(h.engine.pause());

        let before = h.engine.state().clone();
        for _ in 0..20 {
            assert!(!h.engine.tick());
        }
        assert_eq!(h.engine.state().elapsed_time, before.elapsed_time);
        assert_eq!(
            h.engine.state().segment_time_remaining,
            before.segment_time_remaining
        );
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let mut h = started("two");
        ticks(&mut h.engine, 2);
        assert_eq!(h.engine.state().elapsed_time, 2);

        assert!(h.engine.pause());
        assert!(h.engine.is_paused());
        assert!(h.engine.state().pause_start_time.is_some());
        ticks(&mut h.engine, 3);
        assert_eq!(h.engine.state().elapsed_time, 2);

        // Wall clock decides the pause length, not the number of ticks
        h.clock.advance_millis(7_900);
        assert!(h.engine.resume());
        ticks(&mut h.engine, 2);

        let state = h.engine.state();
        assert_eq!(state.elapsed_time, 4);
        assert_eq!(state.segment_time_remaining, 56);
        assert_eq!(state.total_pause_duration, 7);
        assert!(state.pause_start_time.is_none());
        assert_eq!(state.pauses.len(), 1);
        assert_eq!(state.pauses[0].duration, 7);
        assert!(state.pauses[0].end_time.is_some());
    }

    #[test]
    fn test_multiple_pauses_accumulate() {
        let mut h = started("two");
        for secs in [3, 10] {
            h.engine.tick();
            h.engine.pause();
            h.clock.advance_secs(secs);
            h.engine.resume();
        }
        assert_eq!(h.engine.state().total_pause_duration, 13);
        assert_eq!(h.engine.state().pauses.len(), 2);
        assert_eq!(h.engine.state().elapsed_time, 2);
    }

    #[test]
    fn test_invalid_transitions_are_noops() {
        let mut h = harness();
        assert!(!h.engine.tick());
        assert!(!h.engine.pause());
        assert!(!h.engine.resume());
        assert!(!h.engine.skip());
        assert_eq!(h.engine.state(), &SessionState::default());

        h.engine.start("two").unwrap();
        assert!(!h.engine.resume());
        assert!(h.engine.pause());
        assert!(!h.engine.pause());
        assert_eq!(h.engine.state().pauses.len(), 1);
    }

    #[test]
    fn test_skip_advances_exactly_one_segment() {
        let mut h = started("three");

        assert!(h.engine.skip());
        assert_eq!(h.engine.state().current_segment_index, 1);
        assert_eq!(h.engine.state().segment_time_remaining, 90);

        // Double-tap inside the debounce window
        assert!(!h.engine.skip());
        assert_eq!(h.engine.state().current_segment_index, 1);
        assert_eq!(h.engine.state().completed_segments.len(), 1);
    }

    #[test]
    fn test_skip_allowed_again_after_debounce_window() {
        let mut h = started("three");
        assert!(h.engine.skip());

        h.clock.advance_millis(499);
        assert!(!h.engine.skip());

        h.clock.advance_millis(1);
        assert!(h.engine.skip());
        assert_eq!(h.engine.state().current_segment_index, 2);
    }

    #[test]
    fn test_skip_not_locked_out_after_clock_steps_back() {
        let mut h = started("three");
        assert!(h.engine.skip());

        h.clock.advance_secs(-60);
        h.clock.advance_secs(5);
        assert!(h.engine.skip());
        assert_eq!(h.engine.state().current_segment_index, 2);
    }

    #[test]
    fn test_skip_records_time_actually_spent() {
        let mut h = started("three");
        ticks(&mut h.engine, 10);
        h.engine.skip();

        assert_eq!(
            h.engine.state().completed_segments[0],
            CompletedSegment {
                pace: PaceType::Base,
                planned_duration: 60,
                actual_duration: 10,
                skipped: true,
            }
        );
        assert_eq!(h.engine.state().elapsed_time, 10);
    }

    #[test]
    fn test_countdown_continues_after_skip() {
        let mut h = started("three");
        ticks(&mut h.engine, 10);
        h.engine.skip();

        h.engine.tick();
        assert_eq!(h.engine.state().elapsed_time, 11);
        assert_eq!(h.engine.state().current_segment_index, 1);
        assert_eq!(h.engine.state().segment_time_remaining, 89);

        // The skipped segment's planned remainder is never replayed
        ticks(&mut h.engine, 89);
        assert_eq!(h.engine.state().elapsed_time, 100);
        assert_eq!(h.engine.state().current_segment_index, 2);
        assert_eq!(h.engine.state().segment_time_remaining, 30);
    }

    #[test]
    fn test_skip_while_paused_rejected() {
        let mut h = started("three");
        h.engine.pause();
        assert!(!h.engine.skip());
        assert_eq!(h.engine.state().current_segment_index, 0);
        assert!(h.engine.state().completed_segments.is_empty());
    }

    #[test]
    fn test_skip_last_segment_completes() {
        let mut h = started("single");
        h.engine.tick();
        assert!(h.engine.skip());

        assert!(h.engine.is_completed());
        assert!(!h.heartbeat.state().armed);
        assert_eq!(h.engine.state().completed_segments.len(), 1);
        assert_eq!(h.engine.state().completed_segments[0].actual_duration, 1);
        assert!(!h.engine.skip());
    }

    #[test]
    fn test_skip_then_tick_stays_in_sync() {
        let mut h = started("three");

        // Interleave skips and ticks the way a jittery UI would
        for _ in 0..5 {
            h.engine.tick();
        }
        h.engine.skip();
        h.engine.skip();
        h.engine.tick();
        h.clock.advance_secs(1);
        h.engine.skip();

        let state = h.engine.state();
        assert_eq!(state.current_segment_index, 2);
        assert_eq!(state.completed_segments.len(), 2);
        assert_eq!(state.completed_segments[0].actual_duration, 5);
        assert_eq!(state.completed_segments[1].actual_duration, 1);
        assert_eq!(state.time_before_current_segment(), state.elapsed_time);
        assert_eq!(state.segment_time_remaining, 30);

        ticks(&mut h.engine, 30);
        assert!(h.engine.is_completed());
        assert_eq!(h.engine.state().elapsed_time, 36);
    }

    #[test]
    fn test_remaining_never_exceeds_segment_duration() {
        let mut h = started("three");
        for step in 0..400u32 {
            if step % 37 == 0 {
                h.clock.advance_secs(1);
                h.engine.skip();
            } else {
                h.engine.tick();
            }
            let state = h.engine.state();
            if let Some(segment) = state.current_segment() {
                assert!(state.segment_time_remaining <= segment.duration);
            }
            if state.status != SessionStatus::Completed {
                assert_eq!(state.completed_segments.len(), state.current_segment_index);
            }
        }
        assert!(h.engine.is_completed());
    }

    #[test]
    fn test_end_before_completion_discards_partial_segment() {
        let mut h = started("two");
        ticks(&mut h.engine, 70);

        let outcome = h.engine.end(false).unwrap();
        assert!(outcome.recorded.is_ok());

        let summary = outcome.summary;
        assert_eq!(summary.workout_id, "two");
        assert_eq!(summary.duration, 70);
        assert!(!summary.completed);
        assert_eq!(summary.completed_segments.len(), 1);

        assert_eq!(h.engine.state(), &SessionState::default());
        assert!(!h.heartbeat.state().armed);
    }

    #[test]
    fn test_end_after_completion_is_marked_completed() {
        let mut h = started("two");
        ticks(&mut h.engine, 90);

        let summary = h.engine.end(false).unwrap().summary;
        assert!(summary.completed);
        assert_eq!(summary.duration, 90);
        assert_eq!(summary.completed_segments.len(), 2);
    }

    #[test]
    fn test_end_twice_records_once() {
        let mut h = started("two");
        ticks(&mut h.engine, 3);

        assert!(h.engine.end(true).is_some());
        assert!(h.engine.end(true).is_none());

        assert_eq!(h.history.len(), 1);
        assert_eq!(h.engine.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_end_while_paused_closes_pause() {
        let mut h = started("two");
        ticks(&mut h.engine, 4);
        h.engine.pause();
        h.clock.advance_secs(12);

        let summary = h.engine.end(false).unwrap().summary;
        assert_eq!(summary.duration, 4);
        assert_eq!(summary.pause_duration, 12);
        assert_eq!(summary.pauses.len(), 1);
        assert!(summary.pauses[0].end_time.is_some());
        assert_eq!(summary.end_time - summary.start_time, chrono::Duration::seconds(12));
    }

    #[test]
    fn test_persistence_failure_still_resets() {
        let mut h = harness_with(MemoryHistory::failing());
        h.engine.start("two").unwrap();
        ticks(&mut h.engine, 3);

        let outcome = h.engine.end(true).unwrap();
        assert!(matches!(outcome.recorded, Err(Error::Persistence(_))));
        assert_eq!(outcome.summary.duration, 3);
        assert_eq!(h.engine.status(), SessionStatus::Idle);

        // The engine is usable again straight away
        h.engine.start("two").unwrap();
        assert!(h.engine.tick());
    }

    #[test]
    fn test_late_tick_after_end_is_ignored() {
        let mut h = started("two");
        let generation = h.heartbeat.generation();
        h.engine.end(false);

        assert!(!h.engine.on_timer(generation));
        assert_eq!(h.engine.state(), &SessionState::default());
    }

    #[test]
    fn test_tick_racing_pause_is_suppressed() {
        let mut h = started("two");
        let generation = h.heartbeat.generation();

        assert!(h.engine.on_timer(generation));
        // Tick scheduled before the pause, delivered after it
        h.engine.pause();
        assert!(!h.engine.on_timer(generation));
        assert_eq!(h.engine.state().elapsed_time, 1);
    }

    #[test]
    fn test_snapshot_derived_values() {
        let mut h = started("two");
        ticks(&mut h.engine, 45);

        let snapshot = h.engine.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Running);
        assert_eq!(snapshot.elapsed_time, 45);
        assert_eq!(snapshot.segment_time_remaining, 15);
        assert_eq!(snapshot.total_duration, 90);
        assert_eq!(snapshot.progress_percent, 50.0);
        assert!(!snapshot.is_paused);
        assert!(h.engine.is_workout_active());
    }

    #[test]
    fn test_settings_from_config() {
        let settings = EngineSettings::from(&EngineConfig {
            tick_interval_ms: 250,
            skip_debounce_ms: 100,
        });
        assert_eq!(settings.tick_interval, Duration::from_millis(250));
        assert_eq!(settings.skip_debounce, Duration::from_millis(100));
    }
}
