//! Trainer mode: the roster of students a trainer follows.

use crate::store::{keys, KeyValueStore, StoreExt};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Inactive,
    #[default]
    Pending,
}

impl FromStr for StudentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(StudentStatus::Active),
            "inactive" => Ok(StudentStatus::Inactive),
            "pending" => Ok(StudentStatus::Pending),
            other => Err(Error::Validation(format!("unknown student status '{}'", other))),
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Pending => "pending",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    pub plan: String,
    pub status: StudentStatus,
    /// Percentage, 0-100
    #[serde(default)]
    pub progress: u8,
    #[serde(alias = "joinDate")]
    pub join_date: NaiveDate,
}

/// A student before an id is assigned
#[derive(Clone, Debug)]
pub struct StudentDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub plan: String,
    pub status: StudentStatus,
    pub join_date: NaiveDate,
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct RosterStats {
    pub total_students: usize,
    pub active_students: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    students: Vec<Student>,
    #[serde(default)]
    selected: Option<String>,
}

impl Roster {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        store.load_or_default(keys::STUDENTS)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::STUDENTS, self)
    }

    /// Add a student with a generated id; returns the id
    pub fn add_student(&mut self, draft: StudentDraft) -> Result<String> {
        if draft.name.trim().is_empty() {
            return Err(Error::Validation("student name must not be empty".into()));
        }

        let student = Student {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            age: draft.age,
            plan: draft.plan,
            status: draft.status,
            progress: 0,
            join_date: draft.join_date,
        };

        tracing::info!("Added student '{}' ({})", student.name, student.id);
        let id = student.id.clone();
        self.students.push(student);
        Ok(id)
    }

    /// Remove a student; the selection is cleared if it pointed at them
    pub fn remove_student(&mut self, id: &str) -> bool {
        let before = self.students.len();
        self.students.retain(|s| s.id != id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.students.len() != before
    }

    /// Set a student's progress, clamped to 100
    pub fn update_progress(&mut self, id: &str, progress: u8) -> Result<()> {
        let student = self
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::Validation(format!("unknown student '{}'", id)))?;
        student.progress = progress.min(100);
        Ok(())
    }

    /// Select a student by id, or clear the selection with `None`
    pub fn select(&mut self, id: Option<&str>) -> Result<()> {
        match id {
            Some(id) if self.get(id).is_none() => {
                Err(Error::Validation(format!("unknown student '{}'", id)))
            }
            _ => {
                self.selected = id.map(str::to_string);
                Ok(())
            }
        }
    }

    pub fn selected(&self) -> Option<&Student> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn stats(&self) -> RosterStats {
        RosterStats {
            total_students: self.students.len(),
            active_students: self
                .students
                .iter()
                .filter(|s| s.status == StudentStatus::Active)
                .count(),
        }
    }
}
