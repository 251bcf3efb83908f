//! Core domain types for FitFlow workouts.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and the templates that sequence them
//! - The active session snapshot and its completed-set log
//! - Completed workout summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rest applied when a template exercise carries no usable rest duration
pub const DEFAULT_REST_SECONDS: u32 = 60;

// ============================================================================
// Exercise Types
// ============================================================================

/// An exercise definition from the library (e.g., "Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default, alias = "targetMuscles")]
    pub target_muscles: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// An exercise placed in a template with its per-template targets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "TemplateExerciseRecord")]
pub struct TemplateExercise {
    #[serde(flatten)]
    pub exercise: Exercise,
    /// Target number of sets
    pub sets: u32,
    /// Target rep range, display only (e.g. "8-10")
    pub reps: String,
    /// Rest between sets
    pub rest_seconds: u32,
}

impl TemplateExercise {
    pub fn new(exercise: Exercise, sets: u32, reps: impl Into<String>, rest_seconds: u32) -> Self {
        Self {
            exercise,
            sets,
            reps: reps.into(),
            rest_seconds,
        }
    }

    pub fn id(&self) -> &str {
        &self.exercise.id
    }

    pub fn name(&self) -> &str {
        &self.exercise.name
    }
}

/// On-disk shape of a template exercise.
///
/// Older blobs store rest as free text (`"rest": "90s"`) and leave the set
/// count out; both are normalized here so the engine only sees seconds.
#[derive(Deserialize)]
struct TemplateExerciseRecord {
    #[serde(flatten)]
    exercise: Exercise,
    #[serde(default)]
    sets: Option<u32>,
    #[serde(default)]
    reps: Option<String>,
    #[serde(default)]
    rest_seconds: Option<u32>,
    #[serde(default)]
    rest: Option<String>,
}

impl From<TemplateExerciseRecord> for TemplateExercise {
    fn from(record: TemplateExerciseRecord) -> Self {
        let rest_seconds = record
            .rest_seconds
            .or_else(|| {
                record
                    .rest
                    .as_deref()
                    .and_then(crate::templates::parse_rest_seconds)
            })
            .unwrap_or(DEFAULT_REST_SECONDS);

        Self {
            exercise: record.exercise,
            sets: record.sets.unwrap_or(1),
            reps: record.reps.unwrap_or_default(),
            rest_seconds,
        }
    }
}

/// A user-authored workout template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub difficulty: String,
    /// Duration estimate, display only (e.g. "45-60 min")
    pub duration: String,
    #[serde(default)]
    pub description: Option<String>,
    pub exercises: Vec<TemplateExercise>,
}

// ============================================================================
// Session Types
// ============================================================================

/// Whether the lifter is working or resting between sets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Active,
    Resting,
}

/// One set recorded during a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedSet {
    pub exercise_id: String,
    pub set_number: u32,
    pub reps: u32,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// The single in-progress workout
///
/// Holds its own copy of the template: editing or deleting the template
/// afterwards does not affect a running session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActiveSession {
    pub template: WorkoutTemplate,
    pub start_time: DateTime<Utc>,
    pub current_exercise_index: usize,
    pub current_set: u32,
    #[serde(default)]
    pub phase: SessionPhase,
    #[serde(default)]
    pub rest_time_left: u32,
    /// Wall-clock end of the current rest, used to resume the countdown
    #[serde(default)]
    pub rest_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_sets: Vec<CompletedSet>,
}

impl ActiveSession {
    pub fn new(template: WorkoutTemplate, start_time: DateTime<Utc>) -> Self {
        Self {
            template,
            start_time,
            current_exercise_index: 0,
            current_set: 1,
            phase: SessionPhase::Active,
            rest_time_left: 0,
            rest_ends_at: None,
            completed_sets: Vec::new(),
        }
    }

    /// The exercise the pointer is on, if the index is in range
    pub fn current_exercise(&self) -> Option<&TemplateExercise> {
        self.template.exercises.get(self.current_exercise_index)
    }

    pub fn is_resting(&self) -> bool {
        self.phase == SessionPhase::Resting
    }

    pub fn total_reps(&self) -> u64 {
        self.completed_sets.iter().map(|s| u64::from(s.reps)).sum()
    }

    /// Sets logged against the exercise with the given id
    pub fn sets_for(&self, exercise_id: &str) -> impl Iterator<Item = &CompletedSet> {
        let exercise_id = exercise_id.to_owned();
        self.completed_sets
            .iter()
            .filter(move |s| s.exercise_id == exercise_id)
    }
}

/// Immutable record of a finished workout
///
/// The template name is copied in so the summary outlives the template.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedWorkout {
    pub id: String,
    pub template_id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    /// Rounded minutes between start and end
    #[serde(alias = "duration")]
    pub duration_minutes: i64,
    pub exercises: usize,
    pub completed_sets: usize,
    pub total_reps: u64,
}
