//! Completed workout history.
//!
//! Append-only: summaries are recorded newest first and never removed.

use crate::store::{keys, KeyValueStore, StoreExt};
use crate::{CompletedWorkout, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// All finished workouts, newest first
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutHistory {
    entries: Vec<CompletedWorkout>,
}

impl WorkoutHistory {
    /// Load history; an unreadable blob yields an empty history
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut history: Self = store.load_or_default(keys::HISTORY);
        // Older blobs were not always kept in order
        history.entries.sort_by(|a, b| b.date.cmp(&a.date));
        history
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::HISTORY, self)
    }

    /// Load, modify and save back
    pub fn update<S, F>(store: &mut S, f: F) -> Result<Self>
    where
        S: KeyValueStore + ?Sized,
        F: FnOnce(&mut WorkoutHistory),
    {
        let mut history = Self::load(store);
        f(&mut history);
        history.save(store)?;
        Ok(history)
    }

    /// Record a finished workout at the front of the list
    pub fn record(&mut self, summary: CompletedWorkout) {
        tracing::info!(
            "Recorded workout '{}': {} sets, {} reps in {} min",
            summary.name,
            summary.completed_sets,
            summary.total_reps,
            summary.duration_minutes
        );
        self.entries.insert(0, summary);
    }

    pub fn entries(&self) -> &[CompletedWorkout] {
        &self.entries
    }

    /// Workouts from the last `days` days, newest first
    pub fn recent(&self, days: i64, now: DateTime<Utc>) -> Vec<&CompletedWorkout> {
        let cutoff = now - Duration::days(days);
        self.entries.iter().filter(|w| w.date >= cutoff).collect()
    }

    /// Workouts whose date falls inside `[start, end]`
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&CompletedWorkout> {
        self.entries
            .iter()
            .filter(|w| w.date >= start && w.date <= end)
            .collect()
    }

    pub fn total_workouts(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn summary(name: &str, days_ago: i64) -> CompletedWorkout {
        CompletedWorkout {
            id: uuid::Uuid::new_v4().to_string(),
            template_id: "1".into(),
            name: name.into(),
            date: Utc::now() - Duration::days(days_ago),
            duration_minutes: 50,
            exercises: 6,
            completed_sets: 20,
            total_reps: 200,
        }
    }

    #[test]
    fn test_record_prepends() {
        let mut history = WorkoutHistory::default();
        history.record(summary("older", 2));
        history.record(summary("newer", 1));

        assert_eq!(history.entries()[0].name, "newer");
        assert_eq!(history.total_workouts(), 2);
    }

    #[test]
    fn test_update_persists() {
        let mut store = MemoryStore::new();
        WorkoutHistory::update(&mut store, |h| h.record(summary("legs", 0))).unwrap();
        WorkoutHistory::update(&mut store, |h| h.record(summary("back", 0))).unwrap();

        let loaded = WorkoutHistory::load(&store);
        assert_eq!(loaded.total_workouts(), 2);
    }

    #[test]
    fn test_recent_window() {
        let mut history = WorkoutHistory::default();
        history.record(summary("old", 10));
        history.record(summary("mid", 3));
        history.record(summary("new", 0));

        let recent = history.recent(7, Utc::now());
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "new");
    }

    #[test]
    fn test_load_sorts_newest_first() {
        let mut store = MemoryStore::new();
        let entries = vec![summary("old", 5), summary("new", 1)];
        store.save(keys::HISTORY, &entries).unwrap();

        let history = WorkoutHistory::load(&store);
        assert_eq!(history.entries()[0].name, "new");
    }

    #[test]
    fn test_legacy_duration_field() {
        let json = r#"[{
            "id": "1", "template_id": "1", "name": "Back Day",
            "date": "2024-03-01T18:00:00.000Z", "duration": 52,
            "exercises": 7, "completed_sets": 21, "total_reps": 245
        }]"#;
        let mut store = MemoryStore::new();
        store.put(keys::HISTORY, json.into()).unwrap();

        let history = WorkoutHistory::load(&store);
        assert_eq!(history.entries()[0].duration_minutes, 52);
    }
}
