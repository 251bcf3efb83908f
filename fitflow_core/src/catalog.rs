//! Built-in reference data: exercise library, starter template and foods.

use crate::nutrition::Food;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Read-only reference data shared by every component
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
    pub foods: Vec<Food>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// The exercise library offered when authoring templates
pub fn exercise_library() -> &'static [Exercise] {
    &DEFAULT_CATALOG.exercises
}

/// Search the food database by name or category
///
/// An empty query returns the first eight foods.
pub fn search_foods(query: &str) -> Vec<Food> {
    let foods = &DEFAULT_CATALOG.foods;
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return foods.iter().take(8).cloned().collect();
    }

    foods
        .iter()
        .filter(|f| {
            f.name.to_lowercase().contains(&query) || f.category.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

fn exercise(id: &str, name: &str, category: &str, muscles: &[&str], steps: &[&str]) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        target_muscles: muscles.iter().map(|m| m.to_string()).collect(),
        instructions: steps.iter().map(|s| s.to_string()).collect(),
    }
}

fn food(id: &str, name: &str, category: &str, macros: [f64; 4]) -> Food {
    let [calories, protein, carbs, fat] = macros;
    Food {
        id: id.into(),
        name: name.into(),
        category: category.into(),
        calories_per_100g: calories,
        protein_per_100g: protein,
        carbs_per_100g: carbs,
        fat_per_100g: fat,
    }
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    let exercises = vec![
        exercise(
            "1",
            "Bench Press",
            "Chest",
            &["Pectorals", "Triceps", "Deltoids"],
            &[
                "Lie on the bench with your feet flat on the floor",
                "Grip the bar slightly wider than shoulder width",
                "Lower the bar under control until it touches the chest",
                "Press the bar back to the starting position",
            ],
        ),
        exercise(
            "2",
            "Squat",
            "Legs",
            &["Quadriceps", "Glutes", "Hamstrings"],
            &[
                "Place your feet shoulder width apart",
                "Sit back as if lowering onto a chair",
                "Keep the torso upright and knees tracking the toes",
                "Drive back up to the starting position",
            ],
        ),
        exercise(
            "3",
            "Lat Pulldown",
            "Back",
            &["Latissimus", "Biceps", "Rhomboids"],
            &[
                "Sit with your knees secured under the pads",
                "Take an overhand grip on the bar",
                "Pull the bar down to chest height",
                "Control the bar on the way up",
            ],
        ),
        exercise(
            "4",
            "Overhead Press",
            "Shoulders",
            &["Deltoids", "Triceps"],
            &[
                "Stand with your feet shoulder width apart",
                "Hold the bar at shoulder height",
                "Press overhead until the arms are fully extended",
                "Lower under control",
            ],
        ),
    ];

    let foods = vec![
        food("1", "Banana", "Fruit", [89.0, 1.1, 23.0, 0.3]),
        food("2", "Chicken Breast", "Protein", [165.0, 31.0, 0.0, 3.6]),
        food("3", "Brown Rice", "Carbohydrates", [123.0, 2.6, 23.0, 0.9]),
        food("4", "Eggs", "Protein", [155.0, 13.0, 1.1, 11.0]),
        food("5", "Oats", "Cereals", [389.0, 17.0, 66.0, 7.0]),
        food("6", "Sweet Potato", "Carbohydrates", [86.0, 1.6, 20.0, 0.1]),
        food("7", "Salmon", "Protein", [208.0, 25.0, 0.0, 12.0]),
        food("8", "Broccoli", "Vegetables", [34.0, 2.8, 7.0, 0.4]),
    ];

    Catalog { exercises, foods }
}

/// The template seeded into an empty template library
pub fn default_template() -> WorkoutTemplate {
    let library = exercise_library();
    let accessory = |id: &str, name: &str, category: &str, muscle: &str| {
        exercise(id, name, category, &[muscle], &[])
    };

    WorkoutTemplate {
        id: "1".into(),
        name: "Chest & Triceps".into(),
        category: "Upper Body".into(),
        difficulty: "Intermediate".into(),
        duration: "45-60 min".into(),
        description: Some("Session focused on chest and triceps development".into()),
        exercises: vec![
            TemplateExercise::new(library[0].clone(), 4, "8-10", 90),
            TemplateExercise::new(
                accessory("5", "Incline Bench Press", "Chest", "Pectorals"),
                3,
                "10-12",
                90,
            ),
            TemplateExercise::new(accessory("6", "Chest Fly", "Chest", "Pectorals"), 3, "12-15", 60),
            TemplateExercise::new(accessory("7", "Dips", "Triceps", "Triceps"), 3, "10-12", 60),
            TemplateExercise::new(
                accessory("8", "Skull Crushers", "Triceps", "Triceps"),
                4,
                "10-12",
                60,
            ),
            TemplateExercise::new(
                accessory("9", "Rope Pushdown", "Triceps", "Triceps"),
                3,
                "12-15",
                45,
            ),
        ],
    }
}

impl Catalog {
    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for ex in &self.exercises {
            if !seen.insert(ex.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", ex.id));
            }
            if ex.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has an empty name", ex.id));
            }
        }

        let mut seen = HashSet::new();
        for f in &self.foods {
            if !seen.insert(f.id.as_str()) {
                errors.push(format!("Duplicate food id '{}'", f.id));
            }
            let macros = [
                f.calories_per_100g,
                f.protein_per_100g,
                f.carbs_per_100g,
                f.fat_per_100g,
            ];
            if macros.iter().any(|v| *v < 0.0) {
                errors.push(format!("Food '{}' has a negative nutrient value", f.id));
            }
        }

        errors
    }

    /// Fail with [`Error::CatalogValidation`] if `validate` reports anything
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            tracing::error!("Catalog: {}", error);
        }
        Err(Error::CatalogValidation(errors.join("; ")))
    }

    pub fn find_exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn find_food(&self, id: &str) -> Option<&Food> {
        self.foods.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.exercises.len(), 4);
        assert_eq!(catalog.foods.len(), 8);
    }

    #[test]
    fn test_default_catalog_validates() {
        let errors = get_default_catalog().validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let mut catalog = build_default_catalog();
        let dup = catalog.exercises[0].clone();
        catalog.exercises.push(dup);
        assert_eq!(catalog.validate().len(), 1);
    }

    #[test]
    fn test_ensure_valid_rejects_bad_catalog() {
        assert!(get_default_catalog().ensure_valid().is_ok());

        let mut catalog = build_default_catalog();
        let dup = catalog.foods[0].clone();
        catalog.foods.push(dup);
        catalog.exercises[1].name = "  ".into();

        match catalog.ensure_valid() {
            Err(Error::CatalogValidation(msg)) => {
                assert!(msg.contains("Duplicate food id"));
                assert!(msg.contains("empty name"));
            }
            other => panic!("Expected catalog validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_template_uses_library_exercise() {
        let template = default_template();
        assert_eq!(template.exercises.len(), 6);
        assert_eq!(template.exercises[0].exercise, exercise_library()[0]);
        assert_eq!(template.exercises[0].rest_seconds, 90);
    }

    #[test]
    fn test_search_foods() {
        assert_eq!(search_foods("").len(), 8);
        assert_eq!(search_foods("  ").len(), 8);

        let protein = search_foods("PROTEIN");
        assert_eq!(protein.len(), 3);

        let salmon = search_foods("salm");
        assert_eq!(salmon.len(), 1);
        assert_eq!(salmon[0].name, "Salmon");

        assert!(search_foods("pizza").is_empty());
    }
}
