//! Body progress log, time filtering and period reports.

use crate::history::WorkoutHistory;
use crate::nutrition::NutritionLog;
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::{CompletedWorkout, Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Anything with a timestamp that can be windowed by a [`TimeFilter`]
pub trait Dated {
    fn date(&self) -> DateTime<Utc>;
}

impl Dated for CompletedWorkout {
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

/// Tape measurements in centimetres
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BodyMeasurements {
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub arms: f64,
    pub thighs: f64,
}

/// A weigh-in
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressEntry {
    pub date: DateTime<Utc>,
    pub weight: f64,
    #[serde(default, alias = "bodyFat")]
    pub body_fat: Option<f64>,
    #[serde(default)]
    pub muscle: Option<f64>,
    #[serde(default)]
    pub measurements: Option<BodyMeasurements>,
}

impl Dated for ProgressEntry {
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

/// Reporting window
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeFilter {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "1y")]
    Year,
    #[serde(rename = "all")]
    All,
}

impl TimeFilter {
    /// Window length in days; `None` for everything
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeFilter::Week => Some(7),
            TimeFilter::Month => Some(30),
            TimeFilter::Quarter => Some(90),
            TimeFilter::Year => Some(365),
            TimeFilter::All => None,
        }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|d| now - Duration::days(d))
    }

    /// Keep the items dated inside the window
    pub fn apply<'a, T: Dated>(&self, items: &'a [T], now: DateTime<Utc>) -> Vec<&'a T> {
        match self.cutoff(now) {
            Some(cutoff) => items.iter().filter(|i| i.date() >= cutoff).collect(),
            None => items.iter().collect(),
        }
    }
}

impl FromStr for TimeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "7d" => Ok(TimeFilter::Week),
            "30d" => Ok(TimeFilter::Month),
            "90d" => Ok(TimeFilter::Quarter),
            "1y" => Ok(TimeFilter::Year),
            "all" => Ok(TimeFilter::All),
            other => Err(Error::Validation(format!("unknown time filter '{}'", other))),
        }
    }
}

/// Weigh-ins, oldest first
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyProgress {
    entries: Vec<ProgressEntry>,
}

impl BodyProgress {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut progress: Self = store.load_or_default(keys::BODY_PROGRESS);
        progress.entries.sort_by(|a, b| a.date.cmp(&b.date));
        progress
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::BODY_PROGRESS, self)
    }

    pub fn add(&mut self, entry: ProgressEntry) -> Result<()> {
        if !(entry.weight.is_finite() && entry.weight > 0.0) {
            return Err(Error::Validation(format!("invalid weight {}", entry.weight)));
        }
        let pos = self.entries.partition_point(|e| e.date <= entry.date);
        self.entries.insert(pos, entry);
        Ok(())
    }

    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }

    pub fn first(&self) -> Option<&ProgressEntry> {
        self.entries.first()
    }

    pub fn latest(&self) -> Option<&ProgressEntry> {
        self.entries.last()
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BodyReport {
    pub total_entries: usize,
    pub weight_change: f64,
    pub avg_weight: Option<f64>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WorkoutReport {
    pub total_workouts: usize,
    pub total_duration_minutes: i64,
    pub total_reps: u64,
    pub avg_duration_minutes: Option<f64>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NutritionReport {
    pub total_days: usize,
    pub avg_calories: Option<f64>,
    pub avg_protein: Option<f64>,
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    (n > 0).then(|| values.sum::<f64>() / n as f64)
}

pub fn body_report(progress: &BodyProgress, filter: TimeFilter, now: DateTime<Utc>) -> BodyReport {
    let entries = filter.apply(progress.entries(), now);
    let weight_change = match (entries.first(), entries.last()) {
        (Some(first), Some(last)) if entries.len() > 1 => last.weight - first.weight,
        _ => 0.0,
    };

    BodyReport {
        total_entries: entries.len(),
        weight_change,
        avg_weight: mean(entries.iter().map(|e| e.weight)),
    }
}

pub fn workout_report(history: &WorkoutHistory, filter: TimeFilter, now: DateTime<Utc>) -> WorkoutReport {
    let workouts = filter.apply(history.entries(), now);

    WorkoutReport {
        total_workouts: workouts.len(),
        total_duration_minutes: workouts.iter().map(|w| w.duration_minutes).sum(),
        total_reps: workouts.iter().map(|w| w.total_reps).sum(),
        avg_duration_minutes: mean(workouts.iter().map(|w| w.duration_minutes as f64)),
    }
}

/// Per-day averages over the days with logged food inside the window
pub fn nutrition_report(log: &NutritionLog, filter: TimeFilter, now: DateTime<Utc>) -> NutritionReport {
    let cutoff = filter.cutoff(now).map(|c| c.date_naive());
    let days: Vec<_> = log
        .logged_days()
        .into_iter()
        .filter(|d| cutoff.map_or(true, |c| *d >= c))
        .map(|d| log.daily_totals(d))
        .collect();

    NutritionReport {
        total_days: days.len(),
        avg_calories: mean(days.iter().map(|t| t.calories as f64)),
        avg_protein: mean(days.iter().map(|t| t.protein as f64)),
    }
}
