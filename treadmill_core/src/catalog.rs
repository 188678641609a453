//! Workout catalog: lookup of workout definitions by ID.
//!
//! This module provides the built-in treadmill programs and the
//! `WorkoutCatalog` seam the session engine reads through.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Read access to workout definitions
pub trait WorkoutCatalog {
    fn get_workout_by_id(&self, id: &str) -> Option<WorkoutDefinition>;
}

/// HashMap-backed catalog
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    pub workouts: HashMap<String, WorkoutDefinition>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<InMemoryCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static InMemoryCatalog {
    &DEFAULT_CATALOG
}

fn seg(pace: PaceType, duration: u32, incline: f32) -> Segment {
    Segment::new(pace, duration, incline)
}

fn program(id: &str, name: &str, segments: Vec<Segment>) -> WorkoutDefinition {
    WorkoutDefinition {
        id: id.into(),
        name: name.into(),
        segments,
    }
}

/// Builds the catalog of built-in treadmill programs
pub fn build_default_catalog() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::default();

    // 20 minutes: warm up, 6 x (1 min run / 1 min recovery), cool down
    let mut intervals = vec![seg(PaceType::Base, 240, 1.0)];
    for _ in 0..6 {
        intervals.push(seg(PaceType::Run, 60, 1.0));
        intervals.push(seg(PaceType::Recovery, 60, 1.0));
    }
    intervals.push(seg(PaceType::Recovery, 240, 0.0));
    catalog.insert(program("classic_intervals_20", "Classic Intervals (20 min)", intervals));

    // 15 minutes: short sprints with long recoveries
    let mut sprints = vec![seg(PaceType::Base, 180, 1.0)];
    for _ in 0..5 {
        sprints.push(seg(PaceType::Sprint, 30, 1.0));
        sprints.push(seg(PaceType::Recovery, 90, 1.0));
    }
    sprints.push(seg(PaceType::Recovery, 120, 0.0));
    catalog.insert(program("sprint_ladder_15", "Sprint Ladder (15 min)", sprints));

    // 30 minutes: incline walk, steady climb and descend
    let mut hills = vec![seg(PaceType::Base, 300, 1.0)];
    for incline in [3.0, 5.0, 7.0, 9.0, 7.0, 5.0, 3.0] {
        hills.push(seg(PaceType::Base, 180, incline));
    }
    hills.push(seg(PaceType::Recovery, 240, 0.0));
    catalog.insert(program("hill_climb_30", "Hill Climb (30 min)", hills));

    // 10 minutes: quick session
    catalog.insert(program(
        "quick_burn_10",
        "Quick Burn (10 min)",
        vec![
            seg(PaceType::Base, 120, 1.0),
            seg(PaceType::Run, 120, 1.0),
            seg(PaceType::Sprint, 60, 2.0),
            seg(PaceType::Run, 120, 1.0),
            seg(PaceType::Sprint, 60, 2.0),
            seg(PaceType::Recovery, 120, 0.0),
        ],
    ));

    catalog
}

impl InMemoryCatalog {
    /// Build a catalog from an explicit list; later entries replace earlier ones
    pub fn from_workouts(workouts: impl IntoIterator<Item = WorkoutDefinition>) -> Self {
        let mut catalog = Self::default();
        for workout in workouts {
            catalog.insert(workout);
        }
        catalog
    }

    /// Insert or replace a workout, keyed by its ID
    pub fn insert(&mut self, workout: WorkoutDefinition) {
        self.workouts.insert(workout.id.clone(), workout);
    }

    /// Default programs plus user-defined ones (user entries win on ID clash)
    pub fn with_overrides(workouts: &[WorkoutDefinition]) -> Self {
        let mut catalog = get_default_catalog().clone();
        for workout in workouts {
            tracing::debug!("Adding user workout '{}'", workout.id);
            catalog.insert(workout.clone());
        }
        catalog
    }

    /// Workouts sorted by ID for stable listing
    pub fn sorted(&self) -> Vec<&WorkoutDefinition> {
        let mut list: Vec<_> = self.workouts.values().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, workout) in &self.workouts {
            if id.is_empty() || workout.id.is_empty() {
                errors.push("Workout has empty ID".to_string());
            }
            if id != &workout.id {
                errors.push(format!(
                    "Workout key '{}' doesn't match workout.id '{}'",
                    id, workout.id
                ));
            }
            if workout.name.is_empty() {
                errors.push(format!("Workout '{}' has empty name", id));
            }
            if workout.segments.is_empty() {
                errors.push(format!("Workout '{}' has no segments", id));
            }

            for (i, segment) in workout.segments.iter().enumerate() {
                if segment.duration == 0 {
                    errors.push(format!("Workout '{}': segment {} has zero duration", id, i));
                }
                if segment.incline < 0.0 || !segment.incline.is_finite() {
                    errors.push(format!(
                        "Workout '{}': segment {} has invalid incline {}",
                        id, i, segment.incline
                    ));
                }
            }
        }

        errors
    }
}

impl WorkoutCatalog for InMemoryCatalog {
    fn get_workout_by_id(&self, id: &str) -> Option<WorkoutDefinition> {
        self.workouts.get(id).cloned()
    }
}
