//! Workout template library.
//!
//! Templates are created and deleted, never patched in place. The whole
//! collection lives under one storage key.

use crate::store::{keys, KeyValueStore, StoreExt};
use crate::{Error, Result, TemplateExercise, WorkoutTemplate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parse a free-text rest duration into seconds
///
/// Accepts plain seconds (`"90"`, `"90s"`, `"90 sec"`) and minutes
/// (`"2m"`, `"2 min"`). Returns `None` for anything else.
pub fn parse_rest_seconds(text: &str) -> Option<u32> {
    let text = text.trim().to_lowercase();
    let digits_end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    if digits_end == 0 {
        return None;
    }

    let value: u32 = text[..digits_end].parse().ok()?;
    match text[digits_end..].trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Some(value),
        "m" | "min" | "mins" | "minute" | "minutes" => value.checked_mul(60),
        _ => None,
    }
}

/// Everything needed to create a template except its id
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    pub category: String,
    pub difficulty: String,
    pub duration: String,
    pub description: Option<String>,
    pub exercises: Vec<TemplateExercise>,
}

/// The user's collection of workout templates
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateLibrary {
    templates: Vec<WorkoutTemplate>,
}

impl Default for TemplateLibrary {
    /// A fresh library starts with the built-in template
    fn default() -> Self {
        Self {
            templates: vec![crate::catalog::default_template()],
        }
    }
}

impl TemplateLibrary {
    pub fn empty() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Load the library, falling back to the default library if the blob is
    /// missing or corrupt
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        store.load_or_default(keys::TEMPLATES)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::TEMPLATES, self)?;
        tracing::debug!("Saved {} templates", self.templates.len());
        Ok(())
    }

    /// Load, modify and save back
    pub fn update<S, F, R>(store: &mut S, f: F) -> Result<R>
    where
        S: KeyValueStore + ?Sized,
        F: FnOnce(&mut TemplateLibrary) -> Result<R>,
    {
        let mut library = Self::load(store);
        let result = f(&mut library)?;
        library.save(store)?;
        Ok(result)
    }

    /// Add a new template with a generated id
    ///
    /// A template must have a name and at least one exercise; the session
    /// engine relies on this guard instead of validating on start.
    pub fn create(&mut self, draft: TemplateDraft) -> Result<&WorkoutTemplate> {
        if draft.name.trim().is_empty() {
            return Err(Error::Validation("template name must not be empty".into()));
        }
        if draft.exercises.is_empty() {
            return Err(Error::Validation(format!(
                "template '{}' needs at least one exercise",
                draft.name
            )));
        }
        if let Some(ex) = draft.exercises.iter().find(|e| e.sets == 0) {
            return Err(Error::Validation(format!(
                "exercise '{}' needs at least one set",
                ex.name()
            )));
        }

        let template = WorkoutTemplate {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            category: draft.category,
            difficulty: draft.difficulty,
            duration: draft.duration,
            description: draft.description,
            exercises: draft.exercises,
        };

        tracing::info!("Created template '{}' ({})", template.name, template.id);
        self.templates.push(template);
        Ok(&self.templates[self.templates.len() - 1])
    }

    /// Remove a template by id; returns whether anything was removed
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        let removed = self.templates.len() != before;
        if removed {
            tracing::info!("Deleted template {}", id);
        } else {
            tracing::debug!("No template with id {} to delete", id);
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&WorkoutTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkoutTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::Exercise;

    fn draft(name: &str, exercises: usize) -> TemplateDraft {
        TemplateDraft {
            name: name.into(),
            category: "Full Body".into(),
            difficulty: "Beginner".into(),
            duration: "30 min".into(),
            description: None,
            exercises: (0..exercises)
                .map(|i| {
                    TemplateExercise::new(
                        Exercise {
                            id: format!("ex{}", i),
                            name: format!("Exercise {}", i),
                            category: "Test".into(),
                            target_muscles: vec![],
                            instructions: vec![],
                        },
                        3,
                        "10",
                        60,
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_rest_seconds() {
        assert_eq!(parse_rest_seconds("90s"), Some(90));
        assert_eq!(parse_rest_seconds("90"), Some(90));
        assert_eq!(parse_rest_seconds(" 45 sec "), Some(45));
        assert_eq!(parse_rest_seconds("2min"), Some(120));
        assert_eq!(parse_rest_seconds("2 m"), Some(120));
        assert_eq!(parse_rest_seconds("s"), None);
        assert_eq!(parse_rest_seconds("a while"), None);
        assert_eq!(parse_rest_seconds("90x"), None);
    }

    #[test]
    fn test_fresh_library_has_default_template() {
        let store = MemoryStore::new();
        let library = TemplateLibrary::load(&store);
        assert_eq!(library.len(), 1);
        assert!(library.get("1").is_some());
    }

    #[test]
    fn test_create_and_delete() {
        let mut library = TemplateLibrary::empty();
        let id = library.create(draft("Legs", 2)).unwrap().id.clone();
        assert_eq!(library.len(), 1);
        assert_eq!(library.get(&id).unwrap().exercises.len(), 2);

        assert!(library.delete(&id));
        assert!(!library.delete(&id));
        assert!(library.is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut library = TemplateLibrary::empty();
        let a = library.create(draft("A", 1)).unwrap().id.clone();
        let b = library.create(draft("B", 1)).unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_template_rejected() {
        let mut library = TemplateLibrary::empty();
        assert!(matches!(
            library.create(draft("Nothing", 0)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            library.create(draft("  ", 1)),
            Err(Error::Validation(_))
        ));
        assert!(library.is_empty());
    }

    #[test]
    fn test_update_persists() {
        let mut store = MemoryStore::new();
        let id = TemplateLibrary::update(&mut store, |lib| {
            Ok(lib.create(draft("Push", 3))?.id.clone())
        })
        .unwrap();

        let reloaded = TemplateLibrary::load(&store);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(&id).unwrap().name, "Push");
    }

    #[test]
    fn test_corrupt_blob_loads_default() {
        let mut store = MemoryStore::new();
        store.put(keys::TEMPLATES, "[{ broken".into()).unwrap();
        let library = TemplateLibrary::load(&store);
        assert_eq!(library.len(), 1);
    }
}
