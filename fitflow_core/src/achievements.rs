//! Achievements and their progress.
//!
//! Each achievement tracks one metric derived from the workout history,
//! nutrition log or body progress. Evaluation recomputes every metric from
//! scratch; an achievement unlocks the first time its progress reaches the
//! target and keeps its unlock time forever, even if the metric later drops.

use crate::history::WorkoutHistory;
use crate::nutrition::NutritionLog;
use crate::progress::BodyProgress;
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Workout,
    Nutrition,
    Consistency,
    Milestone,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: AchievementCategory,
    pub rarity: Rarity,
    pub progress: f64,
    pub max_progress: f64,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// Collections the achievement metrics are computed from
#[derive(Clone, Copy)]
pub struct AchievementInputs<'a> {
    pub history: &'a WorkoutHistory,
    pub nutrition: &'a NutritionLog,
    pub body: &'a BodyProgress,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AchievementSummary {
    pub unlocked: usize,
    pub total: usize,
    pub percentage: f64,
}

fn definition(
    id: &str,
    title: &str,
    description: &str,
    category: AchievementCategory,
    rarity: Rarity,
    max_progress: f64,
) -> Achievement {
    Achievement {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        category,
        rarity,
        progress: 0.0,
        max_progress,
        unlocked_at: None,
    }
}

/// The built-in achievement set, all locked
pub fn default_achievements() -> Vec<Achievement> {
    use AchievementCategory::*;
    vec![
        definition(
            "first_workout",
            "First Workout",
            "Complete your first workout",
            Workout,
            Rarity::Common,
            1.0,
        ),
        definition(
            "week_streak",
            "Consistent Week",
            "Train 7 days in a row",
            Consistency,
            Rarity::Rare,
            7.0,
        ),
        definition(
            "calories_goal",
            "Calorie Target",
            "Hit your calorie goal on 5 days",
            Nutrition,
            Rarity::Common,
            5.0,
        ),
        definition(
            "weight_loss_5kg",
            "First Milestone",
            "Lose 5 kg from your starting weight",
            Milestone,
            Rarity::Epic,
            5.0,
        ),
        definition(
            "hundred_workouts",
            "Centurion",
            "Complete 100 workouts",
            Workout,
            Rarity::Legendary,
            100.0,
        ),
        definition(
            "protein_master",
            "Protein Master",
            "Hit your protein goal on 30 days",
            Nutrition,
            Rarity::Epic,
            30.0,
        ),
    ]
}

/// Length of the run of consecutive training days ending at the most
/// recent one
fn current_streak(history: &WorkoutHistory) -> usize {
    let days: BTreeSet<NaiveDate> = history.entries().iter().map(|w| w.date.date_naive()).collect();
    let mut streak = 0;
    let mut expected: Option<NaiveDate> = None;
    for day in days.iter().rev() {
        match expected {
            Some(e) if *day != e => break,
            _ => {}
        }
        streak += 1;
        expected = Some(*day - Duration::days(1));
    }
    streak
}

/// Current value of the metric behind `id`; `None` when it cannot be
/// computed yet or the id is unknown
fn measure(id: &str, inputs: &AchievementInputs<'_>) -> Option<f64> {
    match id {
        "first_workout" => Some(if inputs.history.is_empty() { 0.0 } else { 1.0 }),
        "week_streak" => Some(current_streak(inputs.history) as f64),
        "calories_goal" => Some(
            inputs
                .nutrition
                .days_meeting(|t, g| t.calories >= i64::from(g.calories)) as f64,
        ),
        "weight_loss_5kg" => {
            let body = inputs.body;
            if body.entries().len() < 2 {
                return None;
            }
            let first = body.first()?.weight;
            let last = body.latest()?.weight;
            Some((first - last).max(0.0))
        }
        "hundred_workouts" => Some(inputs.history.total_workouts() as f64),
        "protein_master" => Some(
            inputs
                .nutrition
                .days_meeting(|t, g| t.protein >= i64::from(g.protein)) as f64,
        ),
        _ => None,
    }
}

/// All achievements with their current progress
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementBoard {
    achievements: Vec<Achievement>,
}

impl Default for AchievementBoard {
    fn default() -> Self {
        Self {
            achievements: default_achievements(),
        }
    }
}

impl AchievementBoard {
    /// Load the board; achievements added since it was saved are appended
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut board: Self = store.load_or_default(keys::ACHIEVEMENTS);
        for def in default_achievements() {
            if !board.achievements.iter().any(|a| a.id == def.id) {
                board.achievements.push(def);
            }
        }
        board
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::ACHIEVEMENTS, self)
    }

    /// Recompute progress and return the achievements unlocked by this call
    pub fn evaluate(&mut self, inputs: &AchievementInputs<'_>, now: DateTime<Utc>) -> Vec<Achievement> {
        let mut unlocked = Vec::new();

        for achievement in &mut self.achievements {
            if let Some(value) = measure(&achievement.id, inputs) {
                achievement.progress = value.clamp(0.0, achievement.max_progress);
            }

            if achievement.progress >= achievement.max_progress && achievement.unlocked_at.is_none() {
                achievement.unlocked_at = Some(now);
                tracing::info!("Achievement unlocked: {}", achievement.title);
                unlocked.push(achievement.clone());
            }
        }

        unlocked
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn unlocked(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter().filter(|a| a.is_unlocked())
    }

    pub fn summary(&self) -> AchievementSummary {
        let total = self.achievements.len();
        let unlocked = self.unlocked().count();
        let percentage = if total == 0 {
            0.0
        } else {
            unlocked as f64 / total as f64 * 100.0
        };
        AchievementSummary {
            unlocked,
            total,
            percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::nutrition::{DailyGoals, MealType};
    use crate::progress::ProgressEntry;
    use crate::store::MemoryStore;
    use crate::CompletedWorkout;

    fn workout(date: DateTime<Utc>) -> CompletedWorkout {
        CompletedWorkout {
            id: uuid::Uuid::new_v4().to_string(),
            template_id: "1".into(),
            name: "Test".into(),
            date,
            duration_minutes: 40,
            exercises: 4,
            completed_sets: 12,
            total_reps: 120,
        }
    }

    fn weigh_in(days_ago: i64, weight: f64) -> ProgressEntry {
        ProgressEntry {
            date: Utc::now() - Duration::days(days_ago),
            weight,
            body_fat: None,
            muscle: None,
            measurements: None,
        }
    }

    struct Fixture {
        history: WorkoutHistory,
        nutrition: NutritionLog,
        body: BodyProgress,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                history: WorkoutHistory::default(),
                nutrition: NutritionLog::default(),
                body: BodyProgress::default(),
            }
        }

        fn inputs(&self) -> AchievementInputs<'_> {
            AchievementInputs {
                history: &self.history,
                nutrition: &self.nutrition,
                body: &self.body,
            }
        }
    }

    #[test]
    fn test_first_workout_unlocks_once() {
        let mut fx = Fixture::new();
        let mut board = AchievementBoard::default();
        assert!(board.evaluate(&fx.inputs(), Utc::now()).is_empty());

        fx.history.record(workout(Utc::now()));
        let first = Utc::now();
        let unlocked = board.evaluate(&fx.inputs(), first);
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, "first_workout");

        // Re-evaluation does not unlock again or move the timestamp
        let later = first + Duration::hours(1);
        assert!(board.evaluate(&fx.inputs(), later).is_empty());
        assert_eq!(board.get("first_workout").unwrap().unlocked_at, Some(first));
    }

    #[test]
    fn test_unlock_survives_metric_regression() {
        let mut fx = Fixture::new();
        fx.body.add(weigh_in(30, 80.0)).unwrap();
        fx.body.add(weigh_in(1, 74.0)).unwrap();

        let mut board = AchievementBoard::default();
        let at = Utc::now();
        board.evaluate(&fx.inputs(), at);
        let achievement = board.get("weight_loss_5kg").unwrap();
        assert_eq!(achievement.progress, 5.0);
        assert_eq!(achievement.unlocked_at, Some(at));

        // Weight comes back up
        fx.body.add(weigh_in(0, 79.0)).unwrap();
        board.evaluate(&fx.inputs(), at + Duration::days(1));
        let achievement = board.get("weight_loss_5kg").unwrap();
        assert_eq!(achievement.progress, 1.0);
        assert_eq!(achievement.unlocked_at, Some(at));
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let mut history = WorkoutHistory::default();
        let now = Utc::now();
        for days_ago in [0, 1, 2, 4, 5] {
            history.record(workout(now - Duration::days(days_ago)));
        }
        // Two workouts on the same day count once
        history.record(workout(now));
        assert_eq!(current_streak(&history), 3);
        assert_eq!(current_streak(&WorkoutHistory::default()), 0);
    }

    #[test]
    fn test_week_streak_unlock() {
        let mut fx = Fixture::new();
        let now = Utc::now();
        for days_ago in 0..9 {
            fx.history.record(workout(now - Duration::days(days_ago)));
        }

        let mut board = AchievementBoard::default();
        let unlocked = board.evaluate(&fx.inputs(), now);
        let ids: Vec<&str> = unlocked.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first_workout", "week_streak"]);
        assert_eq!(board.get("week_streak").unwrap().progress, 7.0);
        assert_eq!(board.get("hundred_workouts").unwrap().progress, 9.0);
    }

    #[test]
    fn test_calorie_days_are_idempotent() {
        let mut fx = Fixture::new();
        fx.nutrition = NutritionLog::with_goals(DailyGoals {
            calories: 300,
            protein: 500,
            carbs: 100,
            fat: 30,
        });
        let oats = get_default_catalog().find_food("5").unwrap().clone();
        fx.nutrition
            .add_item(oats, 100.0, MealType::Breakfast, Utc::now())
            .unwrap();

        let mut board = AchievementBoard::default();
        for _ in 0..3 {
            board.evaluate(&fx.inputs(), Utc::now());
        }
        assert_eq!(board.get("calories_goal").unwrap().progress, 1.0);
        assert_eq!(board.get("protein_master").unwrap().progress, 0.0);
    }

    #[test]
    fn test_summary_and_persistence() {
        let mut fx = Fixture::new();
        fx.history.record(workout(Utc::now()));
        let mut board = AchievementBoard::default();
        board.evaluate(&fx.inputs(), Utc::now());

        let mut store = MemoryStore::new();
        board.save(&mut store).unwrap();
        let loaded = AchievementBoard::load(&store);

        let summary = loaded.summary();
        assert_eq!(summary.total, 6);
        assert_eq!(summary.unlocked, 1);
        assert!(loaded.get("first_workout").unwrap().is_unlocked());
    }
}
