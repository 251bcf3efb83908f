//! User settings: notifications, privacy and display preferences.

use crate::store::{keys, KeyValueStore, StoreExt};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NotificationSettings {
    pub workout_reminders: bool,
    pub meal_reminders: bool,
    pub progress_updates: bool,
    pub weekly_reports: bool,
    pub achievement_alerts: bool,
    pub push_notifications: bool,
    pub email_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            workout_reminders: true,
            meal_reminders: true,
            progress_updates: true,
            weekly_reports: false,
            achievement_alerts: true,
            push_notifications: true,
            email_notifications: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileVisibility {
    Public,
    #[default]
    Friends,
    Private,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub share_workouts: bool,
    pub share_progress: bool,
    pub data_collection: bool,
    pub analytics: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Friends,
            share_workouts: true,
            share_progress: false,
            data_collection: true,
            analytics: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Pt,
    En,
    Es,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHour,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub language: Language,
    pub units: Units,
    pub week_start: WeekStart,
    pub time_format: TimeFormat,
    pub is_trainer_mode: bool,
}

/// Partial update for [`NotificationSettings`]; `None` fields are kept
#[derive(Clone, Debug, Default)]
pub struct NotificationUpdate {
    pub workout_reminders: Option<bool>,
    pub meal_reminders: Option<bool>,
    pub progress_updates: Option<bool>,
    pub weekly_reports: Option<bool>,
    pub achievement_alerts: Option<bool>,
    pub push_notifications: Option<bool>,
    pub email_notifications: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct PrivacyUpdate {
    pub profile_visibility: Option<ProfileVisibility>,
    pub share_workouts: Option<bool>,
    pub share_progress: Option<bool>,
    pub data_collection: Option<bool>,
    pub analytics: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct PreferencesUpdate {
    pub theme: Option<Theme>,
    pub language: Option<Language>,
    pub units: Option<Units>,
    pub week_start: Option<WeekStart>,
    pub time_format: Option<TimeFormat>,
    pub is_trainer_mode: Option<bool>,
}

fn apply<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub preferences: Preferences,
}

/// Exported settings document
#[derive(Serialize)]
struct SettingsExport<'a> {
    #[serde(flatten)]
    settings: &'a Settings,
    export_date: DateTime<Utc>,
}

impl Settings {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        store.load_or_default(keys::SETTINGS)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::SETTINGS, self)
    }

    pub fn update_notifications(&mut self, update: NotificationUpdate) {
        let n = &mut self.notifications;
        apply(&mut n.workout_reminders, update.workout_reminders);
        apply(&mut n.meal_reminders, update.meal_reminders);
        apply(&mut n.progress_updates, update.progress_updates);
        apply(&mut n.weekly_reports, update.weekly_reports);
        apply(&mut n.achievement_alerts, update.achievement_alerts);
        apply(&mut n.push_notifications, update.push_notifications);
        apply(&mut n.email_notifications, update.email_notifications);
    }

    pub fn update_privacy(&mut self, update: PrivacyUpdate) {
        let p = &mut self.privacy;
        apply(&mut p.profile_visibility, update.profile_visibility);
        apply(&mut p.share_workouts, update.share_workouts);
        apply(&mut p.share_progress, update.share_progress);
        apply(&mut p.data_collection, update.data_collection);
        apply(&mut p.analytics, update.analytics);
    }

    pub fn update_preferences(&mut self, update: PreferencesUpdate) {
        let p = &mut self.preferences;
        apply(&mut p.theme, update.theme);
        apply(&mut p.language, update.language);
        apply(&mut p.units, update.units);
        apply(&mut p.week_start, update.week_start);
        apply(&mut p.time_format, update.time_format);
        apply(&mut p.is_trainer_mode, update.is_trainer_mode);
    }

    /// Flip trainer mode; returns the new value
    pub fn toggle_trainer_mode(&mut self) -> bool {
        self.preferences.is_trainer_mode = !self.preferences.is_trainer_mode;
        self.preferences.is_trainer_mode
    }

    pub fn is_trainer_mode(&self) -> bool {
        self.preferences.is_trainer_mode
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    /// Pretty JSON of all settings plus the export timestamp
    pub fn export_json(&self, now: DateTime<Utc>) -> Result<String> {
        let export = SettingsExport {
            settings: self,
            export_date: now,
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }
}
