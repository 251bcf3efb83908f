//! Bioimpedance measurements per student and trend classification.

use crate::config::TrendConfig;
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// One body-composition reading
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub id: String,
    #[serde(alias = "studentId")]
    pub student_id: String,
    pub date: DateTime<Utc>,
    pub weight: f64,
    /// Height in centimetres
    pub height: f64,
    pub bmi: f64,
    #[serde(alias = "bodyFatPercentage")]
    pub body_fat_percentage: f64,
    #[serde(alias = "muscleMass")]
    pub muscle_mass: f64,
    #[serde(default, alias = "boneMass")]
    pub bone_mass: f64,
    #[serde(default, alias = "waterPercentage")]
    pub water_percentage: f64,
    #[serde(default, alias = "basalMetabolicRate")]
    pub basal_metabolic_rate: f64,
    #[serde(default, alias = "visceralFat")]
    pub visceral_fat: f64,
    #[serde(default, alias = "metabolicAge")]
    pub metabolic_age: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A measurement before it gets an id and a BMI
#[derive(Clone, Debug, Default)]
pub struct MeasurementDraft {
    pub student_id: String,
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub height: f64,
    pub body_fat_percentage: f64,
    pub muscle_mass: f64,
    pub bone_mass: f64,
    pub water_percentage: f64,
    pub basal_metabolic_rate: f64,
    pub visceral_fat: f64,
    pub metabolic_age: u32,
    pub notes: Option<String>,
}

/// Targets a trainer sets for a student
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BioimpedanceGoals {
    #[serde(default, alias = "targetWeight")]
    pub target_weight: Option<f64>,
    #[serde(default, alias = "targetBodyFat")]
    pub target_body_fat: Option<f64>,
    #[serde(default, alias = "targetMuscleMass")]
    pub target_muscle_mass: Option<f64>,
    #[serde(default, alias = "targetDate")]
    pub target_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
        };
        f.write_str(s)
    }
}

/// Differences between the two most recent measurements
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq)]
pub struct Changes {
    pub weight: f64,
    pub body_fat: f64,
    pub muscle_mass: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BioimpedanceProgress {
    pub current: Measurement,
    pub previous: Option<Measurement>,
    pub trend: Trend,
    pub changes: Changes,
}

/// BMI from weight in kg and height in cm, rounded to one decimal
pub fn calculate_bmi(weight: f64, height_cm: f64) -> f64 {
    let meters = height_cm / 100.0;
    let bmi = weight / (meters * meters);
    (bmi * 10.0).round() / 10.0
}

/// Classify a change in body composition
///
/// Losing more fat than the threshold while gaining muscle is improving;
/// gaining more fat than the threshold while losing muscle beyond the decline
/// threshold is declining. Everything else is stable.
pub fn classify(changes: &Changes, thresholds: &TrendConfig) -> Trend {
    if changes.body_fat < -thresholds.fat_threshold && changes.muscle_mass > 0.0 {
        Trend::Improving
    } else if changes.body_fat > thresholds.fat_threshold
        && changes.muscle_mass < -thresholds.muscle_decline_threshold
    {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BioimpedanceRecords {
    #[serde(default)]
    measurements: Vec<Measurement>,
    #[serde(default)]
    goals: HashMap<String, BioimpedanceGoals>,
}

impl BioimpedanceRecords {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        store.load_or_default(keys::BIOIMPEDANCE)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::BIOIMPEDANCE, self)
    }

    /// Store a new measurement, computing its BMI; returns the new id
    pub fn add_measurement(&mut self, draft: MeasurementDraft) -> Result<String> {
        if draft.student_id.trim().is_empty() {
            return Err(Error::Validation("measurement needs a student".into()));
        }
        if !(draft.weight > 0.0 && draft.height > 0.0) {
            return Err(Error::Validation(format!(
                "weight and height must be positive (got {} kg, {} cm)",
                draft.weight, draft.height
            )));
        }

        let measurement = Measurement {
            id: Uuid::new_v4().to_string(),
            bmi: calculate_bmi(draft.weight, draft.height),
            student_id: draft.student_id,
            date: draft.date,
            weight: draft.weight,
            height: draft.height,
            body_fat_percentage: draft.body_fat_percentage,
            muscle_mass: draft.muscle_mass,
            bone_mass: draft.bone_mass,
            water_percentage: draft.water_percentage,
            basal_metabolic_rate: draft.basal_metabolic_rate,
            visceral_fat: draft.visceral_fat,
            metabolic_age: draft.metabolic_age,
            notes: draft.notes,
        };

        tracing::debug!(
            "Recorded measurement {} for student {} (BMI {})",
            measurement.id,
            measurement.student_id,
            measurement.bmi
        );
        let id = measurement.id.clone();
        self.measurements.push(measurement);
        Ok(id)
    }

    /// Replace a student's goals
    pub fn update_goals(&mut self, student_id: &str, goals: BioimpedanceGoals) {
        self.goals.insert(student_id.to_string(), goals);
    }

    pub fn goals(&self, student_id: &str) -> Option<&BioimpedanceGoals> {
        self.goals.get(student_id)
    }

    /// A student's measurements, newest first
    pub fn student_data(&self, student_id: &str) -> Vec<&Measurement> {
        let mut data: Vec<&Measurement> = self
            .measurements
            .iter()
            .filter(|m| m.student_id == student_id)
            .collect();
        data.sort_by(|a, b| b.date.cmp(&a.date));
        data
    }

    pub fn latest(&self, student_id: &str) -> Option<&Measurement> {
        self.student_data(student_id).into_iter().next()
    }

    /// Progress with the default trend thresholds
    pub fn progress(&self, student_id: &str) -> Option<BioimpedanceProgress> {
        self.progress_with(student_id, &TrendConfig::default())
    }

    /// Compare the latest measurement against the one before it
    pub fn progress_with(
        &self,
        student_id: &str,
        thresholds: &TrendConfig,
    ) -> Option<BioimpedanceProgress> {
        let data = self.student_data(student_id);
        let current = (*data.first()?).clone();

        let Some(previous) = data.get(1).map(|m| (*m).clone()) else {
            return Some(BioimpedanceProgress {
                current,
                previous: None,
                trend: Trend::Stable,
                changes: Changes::default(),
            });
        };

        let changes = Changes {
            weight: current.weight - previous.weight,
            body_fat: current.body_fat_percentage - previous.body_fat_percentage,
            muscle_mass: current.muscle_mass - previous.muscle_mass,
        };

        Some(BioimpedanceProgress {
            trend: classify(&changes, thresholds),
            current,
            previous: Some(previous),
            changes,
        })
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn draft(student: &str, day: u32, fat: f64, muscle: f64) -> MeasurementDraft {
        MeasurementDraft {
            student_id: student.into(),
            date: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
            weight: 75.0,
            height: 175.0,
            body_fat_percentage: fat,
            muscle_mass: muscle,
            ..Default::default()
        }
    }

    #[test]
    fn test_calculate_bmi() {
        assert_eq!(calculate_bmi(75.2, 175.0), 24.6);
        assert_eq!(calculate_bmi(74.8, 175.0), 24.4);
    }

    #[test]
    fn test_add_measurement_computes_bmi() {
        let mut records = BioimpedanceRecords::default();
        let id = records.add_measurement(draft("1", 1, 18.5, 32.8)).unwrap();

        let latest = records.latest("1").unwrap();
        assert_eq!(latest.id, id);
        assert_eq!(latest.bmi, 24.5);
    }

    #[test]
    fn test_invalid_measurement_rejected() {
        let mut records = BioimpedanceRecords::default();
        let mut bad = draft("1", 1, 18.0, 30.0);
        bad.height = 0.0;
        assert!(records.add_measurement(bad).is_err());
        assert!(records.add_measurement(draft("", 1, 18.0, 30.0)).is_err());
        assert!(records.is_empty());
    }

    #[test]
    fn test_student_data_newest_first() {
        let mut records = BioimpedanceRecords::default();
        records.add_measurement(draft("1", 1, 18.5, 32.8)).unwrap();
        records.add_measurement(draft("1", 20, 17.0, 33.5)).unwrap();
        records.add_measurement(draft("2", 10, 25.0, 28.0)).unwrap();
        records.add_measurement(draft("1", 15, 17.8, 33.2)).unwrap();

        let days: Vec<u32> = records
            .student_data("1")
            .iter()
            .map(|m| chrono::Datelike::day(&m.date))
            .collect();
        assert_eq!(days, vec![20, 15, 1]);
        assert!(records.latest("3").is_none());
    }

    #[test]
    fn test_single_measurement_is_stable() {
        let mut records = BioimpedanceRecords::default();
        records.add_measurement(draft("1", 1, 18.5, 32.8)).unwrap();

        let progress = records.progress("1").unwrap();
        assert_eq!(progress.trend, Trend::Stable);
        assert!(progress.previous.is_none());
        assert_eq!(progress.changes, Changes::default());
        assert!(records.progress("2").is_none());
    }

    #[test]
    fn test_trend_classification() {
        let mut improving = BioimpedanceRecords::default();
        improving.add_measurement(draft("1", 1, 18.5, 32.8)).unwrap();
        improving.add_measurement(draft("1", 15, 17.0, 33.2)).unwrap();
        assert_eq!(improving.progress("1").unwrap().trend, Trend::Improving);

        let mut declining = BioimpedanceRecords::default();
        declining.add_measurement(draft("1", 1, 18.0, 33.0)).unwrap();
        declining.add_measurement(draft("1", 15, 19.5, 32.0)).unwrap();
        assert_eq!(declining.progress("1").unwrap().trend, Trend::Declining);

        // Fat down by less than the threshold
        let mut stable = BioimpedanceRecords::default();
        stable.add_measurement(draft("1", 1, 18.5, 32.8)).unwrap();
        stable.add_measurement(draft("1", 15, 17.8, 33.2)).unwrap();
        let progress = stable.progress("1").unwrap();
        assert_eq!(progress.trend, Trend::Stable);
        assert!((progress.changes.body_fat + 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut records = BioimpedanceRecords::default();
        records.add_measurement(draft("1", 1, 18.5, 32.8)).unwrap();
        records.add_measurement(draft("1", 15, 17.8, 33.2)).unwrap();

        let loose = TrendConfig {
            fat_threshold: 0.5,
            muscle_decline_threshold: 0.5,
        };
        assert_eq!(records.progress_with("1", &loose).unwrap().trend, Trend::Improving);
    }

    #[test]
    fn test_goals_and_persistence() {
        let mut store = MemoryStore::new();
        let mut records = BioimpedanceRecords::default();
        records.add_measurement(draft("1", 1, 18.5, 32.8)).unwrap();
        records.update_goals(
            "1",
            BioimpedanceGoals {
                target_weight: Some(72.0),
                target_body_fat: Some(15.0),
                ..Default::default()
            },
        );
        records.save(&mut store).unwrap();

        let loaded = BioimpedanceRecords::load(&store);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.goals("1").unwrap().target_weight, Some(72.0));
    }
}
