#![forbid(unsafe_code)]

//! Core domain model and business logic for FitFlow.
//!
//! This crate provides:
//! - Domain types (exercises, templates, sessions, summaries)
//! - Exercise, food and achievement catalogs
//! - Key-value persistence (JSON blobs per key)
//! - The workout session engine and its timer
//! - Derived statistics (nutrition, achievements, body composition)
//! - Report export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod templates;
pub mod history;
pub mod timer;
pub mod session;
pub mod nutrition;
pub mod achievements;
pub mod progress;
pub mod bioimpedance;
pub mod trainer;
pub mod settings;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{exercise_library, get_default_catalog, search_foods};
pub use config::Config;
pub use store::{JsonDirStore, KeyValueStore, MemoryStore, StoreExt};
pub use templates::{parse_rest_seconds, TemplateDraft, TemplateLibrary};
pub use history::WorkoutHistory;
pub use timer::{format_time, Cue, CueSink, Timer, TimerEvent, TimerState};
pub use session::WorkoutController;
pub use nutrition::{NutrientTotals, NutritionLog};
pub use achievements::AchievementBoard;
pub use progress::{BodyProgress, TimeFilter};
pub use bioimpedance::{BioimpedanceRecords, Trend};
pub use trainer::Roster;
pub use settings::Settings;
pub use report::{ReportData, ReportPeriod};
