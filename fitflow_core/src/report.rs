//! Period reports over workouts, nutrition and body weight.
//!
//! A [`ReportData`] is aggregated once; the CSV export and the text rendering
//! are both produced from it.

use crate::history::WorkoutHistory;
use crate::nutrition::{DailyGoals, NutrientTotals, NutritionLog};
use crate::progress::BodyProgress;
use crate::timer::format_time;
use crate::{CompletedWorkout, Error, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

/// Inclusive time range a report covers
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::Validation(format!(
                "report period starts after it ends ({} > {})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days up to `now`
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(days.max(0)),
            end: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    fn contains_day(&self, day: NaiveDate) -> bool {
        day >= self.start.date_naive() && day <= self.end.date_naive()
    }
}

/// Nutrition totals for one logged day
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct DailyNutrition {
    pub date: NaiveDate,
    pub totals: NutrientTotals,
}

/// Everything a report shows
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ReportData {
    pub period: ReportPeriod,
    /// Newest first
    pub workouts: Vec<CompletedWorkout>,
    pub total_reps: u64,
    pub total_duration_minutes: i64,
    /// Oldest first
    pub nutrition: Vec<DailyNutrition>,
    pub average_weight: Option<f64>,
    pub goals: DailyGoals,
}

/// A row in the CSV export
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    workout: &'a str,
    duration_minutes: i64,
    exercises: usize,
    completed_sets: usize,
    total_reps: u64,
}

impl<'a> From<&'a CompletedWorkout> for CsvRow<'a> {
    fn from(workout: &'a CompletedWorkout) -> Self {
        CsvRow {
            date: workout.date.to_rfc3339(),
            workout: &workout.name,
            duration_minutes: workout.duration_minutes,
            exercises: workout.exercises,
            completed_sets: workout.completed_sets,
            total_reps: workout.total_reps,
        }
    }
}

impl ReportData {
    pub fn build(
        period: ReportPeriod,
        history: &WorkoutHistory,
        nutrition: &NutritionLog,
        body: &BodyProgress,
    ) -> Self {
        let workouts: Vec<CompletedWorkout> = history
            .between(period.start, period.end)
            .into_iter()
            .cloned()
            .collect();

        let days: Vec<DailyNutrition> = nutrition
            .logged_days()
            .into_iter()
            .filter(|d| period.contains_day(*d))
            .map(|date| DailyNutrition {
                date,
                totals: nutrition.daily_totals(date),
            })
            .collect();

        let weights: Vec<f64> = body
            .entries()
            .iter()
            .filter(|e| period.contains(e.date))
            .map(|e| e.weight)
            .collect();
        let average_weight =
            (!weights.is_empty()).then(|| weights.iter().sum::<f64>() / weights.len() as f64);

        tracing::debug!(
            "Report {} .. {}: {} workouts, {} nutrition days",
            period.start,
            period.end,
            workouts.len(),
            days.len()
        );

        Self {
            period,
            total_reps: workouts.iter().map(|w| w.total_reps).sum(),
            total_duration_minutes: workouts.iter().map(|w| w.duration_minutes).sum(),
            workouts,
            nutrition: days,
            average_weight,
            goals: nutrition.daily_goals,
        }
    }

    /// Days whose calories reached the goal
    pub fn days_meeting_calorie_goal(&self) -> usize {
        self.nutrition
            .iter()
            .filter(|d| d.totals.calories >= i64::from(self.goals.calories))
            .count()
    }

    /// Write one CSV row per workout, with headers
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for workout in &self.workouts {
            writer.serialize(CsvRow::from(workout))?;
        }
        writer.flush()?;
        tracing::info!("Wrote {} workouts to CSV", self.workouts.len());
        Ok(())
    }

    /// Human-readable summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "FitFlow report {} to {}",
            self.period.start.format("%Y-%m-%d"),
            self.period.end.format("%Y-%m-%d")
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "Workouts: {}", self.workouts.len());
        let _ = writeln!(out, "Total reps: {}", self.total_reps);
        let _ = writeln!(
            out,
            "Training time: {}",
            format_time(
                u32::try_from(self.total_duration_minutes.max(0).saturating_mul(60))
                    .unwrap_or(u32::MAX)
            )
        );
        for w in &self.workouts {
            let _ = writeln!(
                out,
                "  {}  {}  {} min, {} sets, {} reps",
                w.date.format("%Y-%m-%d"),
                w.name,
                w.duration_minutes,
                w.completed_sets,
                w.total_reps
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(
            out,
            "Nutrition: {} days logged, {} on calorie goal ({} kcal)",
            self.nutrition.len(),
            self.days_meeting_calorie_goal(),
            self.goals.calories
        );
        for day in &self.nutrition {
            let t = &day.totals;
            let _ = writeln!(
                out,
                "  {}  {} kcal, {} g protein, {} g carbs, {} g fat",
                day.date, t.calories, t.protein, t.carbs, t.fat
            );
        }
        let _ = writeln!(out);

        match self.average_weight {
            Some(w) => {
                let _ = writeln!(out, "Average weight: {:.1} kg", w);
            }
            None => {
                let _ = writeln!(out, "Average weight: no entries");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalog;
    use crate::nutrition::MealType;
    use crate::progress::ProgressEntry;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 18, 0, 0).unwrap()
    }

    fn workout(day: u32, reps: u64) -> CompletedWorkout {
        CompletedWorkout {
            id: format!("w{}", day),
            template_id: "1".into(),
            name: "Chest & Triceps".into(),
            date: at(day),
            duration_minutes: 45,
            exercises: 6,
            completed_sets: 12,
            total_reps: reps,
        }
    }

    fn fixture() -> (WorkoutHistory, NutritionLog, BodyProgress) {
        let mut history = WorkoutHistory::default();
        history.record(workout(1, 100));
        history.record(workout(10, 120));
        history.record(workout(12, 90));

        let oats = get_default_catalog().find_food("5").unwrap().clone();
        let mut log = NutritionLog::default();
        log.add_item(oats.clone(), 100.0, MealType::Breakfast, at(10)).unwrap();
        log.add_item(oats, 100.0, MealType::Breakfast, at(2)).unwrap();

        let mut body = BodyProgress::default();
        for (day, weight) in [(1, 80.0), (9, 79.0), (11, 78.0)] {
            body.add(ProgressEntry {
                date: at(day),
                weight,
                body_fat: None,
                muscle: None,
                measurements: None,
            })
            .unwrap();
        }
        (history, log, body)
    }

    #[test]
    fn test_build_filters_by_period() {
        let (history, log, body) = fixture();
        let period = ReportPeriod::new(at(5), at(12)).unwrap();
        let report = ReportData::build(period, &history, &log, &body);

        assert_eq!(report.workouts.len(), 2);
        assert_eq!(report.workouts[0].id, "w12");
        assert_eq!(report.total_reps, 210);
        assert_eq!(report.total_duration_minutes, 90);
        assert_eq!(report.nutrition.len(), 1);
        assert_eq!(report.nutrition[0].totals.calories, 389);
        assert!((report.average_weight.unwrap() - 78.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_period() {
        assert!(ReportPeriod::new(at(5), at(1)).is_err());
        let period = ReportPeriod::last_days(7, at(10));
        assert!(period.contains(at(4)));
        assert!(!period.contains(at(2)));
    }

    #[test]
    fn test_empty_report() {
        let period = ReportPeriod::last_days(30, at(10));
        let report = ReportData::build(
            period,
            &WorkoutHistory::default(),
            &NutritionLog::default(),
            &BodyProgress::default(),
        );
        assert!(report.workouts.is_empty());
        assert_eq!(report.total_reps, 0);
        assert_eq!(report.average_weight, None);
        assert!(report.render_text().contains("Average weight: no entries"));
    }

    #[test]
    fn test_write_csv() {
        let (history, log, body) = fixture();
        let report = ReportData::build(ReportPeriod::new(at(1), at(31)).unwrap(), &history, &log, &body);

        let mut buf = Vec::new();
        report.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "date,workout,duration_minutes,exercises,completed_sets,total_reps"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with(",Chest & Triceps,45,6,12,90"));
    }

    #[test]
    fn test_render_text() {
        let (history, log, body) = fixture();
        let report = ReportData::build(ReportPeriod::new(at(1), at(31)).unwrap(), &history, &log, &body);
        let text = report.render_text();

        assert!(text.contains("Workouts: 3"));
        assert!(text.contains("Total reps: 310"));
        assert!(text.contains("Training time: 135:00"));
        assert!(text.contains("Nutrition: 2 days logged, 0 on calorie goal (2200 kcal)"));
        assert!(text.contains("Average weight: 79.0 kg"));
    }

    #[test]
    fn test_render_text_saturates_huge_training_time() {
        let mut history = WorkoutHistory::default();
        let mut long = workout(3, 10);
        long.duration_minutes = 80_000_000;
        history.record(long);

        let report = ReportData::build(
            ReportPeriod::new(at(1), at(31)).unwrap(),
            &history,
            &NutritionLog::default(),
            &BodyProgress::default(),
        );
        assert!(report.render_text().contains("Training time: 71582788:15"));
    }
}
