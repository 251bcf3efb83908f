//! Corruption recovery tests for fitflow.
//!
//! These tests verify the system can handle:
//! - Corrupted JSON blobs
//! - Legacy blob shapes
//! - Missing files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitflow"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_active_workout_means_no_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("active-workout.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted session");

    cli(data_dir)
        .args(["workout", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active workout."));

    // A new session replaces the corrupt blob
    cli(data_dir).args(["workout", "start", "1"]).assert().success();
    let contents = fs::read_to_string(data_dir.join("active-workout.json")).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&contents).is_ok());
}

#[test]
fn test_null_active_workout_means_no_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("active-workout.json"), "null").unwrap();

    cli(data_dir)
        .args(["workout", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active workout."));
}

#[test]
fn test_corrupted_templates_fall_back_to_default() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("workout-templates.json"), "[{\"id\": ").unwrap();

    cli(data_dir)
        .args(["templates", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chest & Triceps"));
}

#[test]
fn test_corrupted_history_is_replaced_on_next_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("workout-history.json"), "not json at all").unwrap();

    cli(data_dir)
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts recorded."));

    cli(data_dir).args(["workout", "start", "1"]).assert().success();
    cli(data_dir).args(["workout", "set", "10"]).assert().success();
    cli(data_dir).args(["workout", "end"]).assert().success();

    let contents = fs::read_to_string(data_dir.join("workout-history.json")).unwrap();
    let history: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test]
fn test_legacy_template_rest_text() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let legacy = r#"[{
        "id": "legacy",
        "name": "Old Push Day",
        "category": "Strength",
        "difficulty": "Beginner",
        "duration": "30 min",
        "exercises": [
            {"id": "1", "name": "Bench Press", "category": "Chest",
             "targetMuscles": ["Pectorals"], "instructions": [],
             "sets": 3, "reps": "8-10", "rest": "2min"}
        ]
    }]"#;
    fs::write(data_dir.join("workout-templates.json"), legacy).unwrap();

    cli(data_dir)
        .args(["templates", "show", "legacy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rest 02:00"));

    cli(data_dir).args(["workout", "start", "legacy"]).assert().success();
    cli(data_dir)
        .args(["workout", "rest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resting: 02:00 left"));
}

#[test]
fn test_corrupted_nutrition_log_uses_config_goals() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("nutrition.json"), "{\"items\": [1, 2").unwrap();

    cli(data_dir)
        .args(["food", "totals"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Calories: 0 / 2200 kcal"));
}

#[test]
fn test_missing_data_dir_is_created() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("nested").join("fitflow");

    cli(&data_dir).args(["workout", "start", "1"]).assert().success();
    assert!(data_dir.join("active-workout.json").exists());
}
