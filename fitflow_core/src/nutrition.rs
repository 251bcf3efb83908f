//! Meal logging and daily nutrition totals.
//!
//! Totals are recomputed from the log on every call. Each item contributes
//! `round(per_100g * grams / 100)` per nutrient, and totals are sums of those
//! rounded contributions.

use crate::config::NutritionGoalsConfig;
use crate::store::{keys, KeyValueStore, StoreExt};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A food from the database, nutrients per 100 g
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Food {
    pub id: String,
    pub name: String,
    pub category: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub carbs_per_100g: f64,
    pub fat_per_100g: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl FromStr for MealType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "snack" => Ok(MealType::Snack),
            "dinner" => Ok(MealType::Dinner),
            other => Err(Error::Validation(format!("unknown meal type '{}'", other))),
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Snack => "snack",
            MealType::Dinner => "dinner",
        };
        f.write_str(name)
    }
}

/// One logged portion of a food
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MealItem {
    pub id: String,
    pub food: Food,
    pub quantity_grams: f64,
    pub meal_type: MealType,
    pub logged_at: DateTime<Utc>,
}

/// Calories and macros, whole units
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NutrientTotals {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fat: i64,
}

impl NutrientTotals {
    /// Contribution of `grams` of `food`
    pub fn of(food: &Food, grams: f64) -> Self {
        let portion = |per_100g: f64| (per_100g * grams / 100.0).round() as i64;
        Self {
            calories: portion(food.calories_per_100g),
            protein: portion(food.protein_per_100g),
            carbs: portion(food.carbs_per_100g),
            fat: portion(food.fat_per_100g),
        }
    }
}

impl std::ops::Add for NutrientTotals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }
}

impl std::iter::Sum for NutrientTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, t| acc + t)
    }
}

/// Daily targets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyGoals {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

impl Default for DailyGoals {
    fn default() -> Self {
        NutritionGoalsConfig::default().into()
    }
}

impl From<NutritionGoalsConfig> for DailyGoals {
    fn from(config: NutritionGoalsConfig) -> Self {
        Self {
            calories: config.calories,
            protein: config.protein,
            carbs: config.carbs,
            fat: config.fat,
        }
    }
}

/// Partial goal update; `None` fields keep their current value
#[derive(Clone, Copy, Debug, Default)]
pub struct GoalsUpdate {
    pub calories: Option<u32>,
    pub protein: Option<u32>,
    pub carbs: Option<u32>,
    pub fat: Option<u32>,
}

/// The meal log and the goals it is measured against
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NutritionLog {
    #[serde(default)]
    pub items: Vec<MealItem>,
    #[serde(default)]
    pub daily_goals: DailyGoals,
}

impl NutritionLog {
    pub fn with_goals(goals: DailyGoals) -> Self {
        Self {
            items: Vec::new(),
            daily_goals: goals,
        }
    }

    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        store.load_or_default(keys::NUTRITION)
    }

    /// Load, or start a log with the given goals if none is stored
    pub fn load_or<S: KeyValueStore + ?Sized>(store: &S, goals: DailyGoals) -> Self {
        store
            .load(keys::NUTRITION)
            .unwrap_or_else(|| Self::with_goals(goals))
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.save(keys::NUTRITION, self)
    }

    /// Log a portion; returns the generated item id
    pub fn add_item(
        &mut self,
        food: Food,
        quantity_grams: f64,
        meal_type: MealType,
        logged_at: DateTime<Utc>,
    ) -> Result<String> {
        if !(quantity_grams.is_finite() && quantity_grams > 0.0) {
            return Err(Error::Validation(format!(
                "quantity must be a positive number of grams, got {}",
                quantity_grams
            )));
        }

        let id = Uuid::new_v4().to_string();
        tracing::debug!("Logged {}g of {} for {}", quantity_grams, food.name, meal_type);
        self.items.push(MealItem {
            id: id.clone(),
            food,
            quantity_grams,
            meal_type,
            logged_at,
        });
        Ok(id)
    }

    pub fn remove_item(&mut self, item_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        before != self.items.len()
    }

    pub fn update_goals(&mut self, update: GoalsUpdate) {
        let goals = &mut self.daily_goals;
        goals.calories = update.calories.unwrap_or(goals.calories);
        goals.protein = update.protein.unwrap_or(goals.protein);
        goals.carbs = update.carbs.unwrap_or(goals.carbs);
        goals.fat = update.fat.unwrap_or(goals.fat);
    }

    /// Items logged on `day` (UTC)
    pub fn items_on(&self, day: NaiveDate) -> impl Iterator<Item = &MealItem> {
        self.items
            .iter()
            .filter(move |i| i.logged_at.date_naive() == day)
    }

    /// Totals for everything logged on `day`
    pub fn daily_totals(&self, day: NaiveDate) -> NutrientTotals {
        self.items_on(day)
            .map(|i| NutrientTotals::of(&i.food, i.quantity_grams))
            .sum()
    }

    /// Totals for one meal of `day`
    pub fn totals_by_meal(&self, day: NaiveDate, meal: MealType) -> NutrientTotals {
        self.items_on(day)
            .filter(|i| i.meal_type == meal)
            .map(|i| NutrientTotals::of(&i.food, i.quantity_grams))
            .sum()
    }

    /// Totals over the whole log
    pub fn all_totals(&self) -> NutrientTotals {
        self.items
            .iter()
            .map(|i| NutrientTotals::of(&i.food, i.quantity_grams))
            .sum()
    }

    /// Distinct days that have at least one item, oldest first
    pub fn logged_days(&self) -> BTreeSet<NaiveDate> {
        self.items.iter().map(|i| i.logged_at.date_naive()).collect()
    }

    /// Number of logged days whose totals satisfy `met`
    pub fn days_meeting<F>(&self, met: F) -> usize
    where
        F: Fn(&NutrientTotals, &DailyGoals) -> bool,
    {
        self.logged_days()
            .into_iter()
            .filter(|day| met(&self.daily_totals(*day), &self.daily_goals))
            .count()
    }
}
