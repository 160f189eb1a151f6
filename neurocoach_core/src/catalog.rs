//! Default catalog of scorable exercises.
//!
//! Exercise ids are part of the external request contract and must stay
//! stable once published.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for tests and custom catalogs.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn reps(points_per_rep: u32) -> MeasurementRule {
    MeasurementRule::RepBased { points_per_rep }
}

fn per_10s(points_per_bucket: u32) -> MeasurementRule {
    MeasurementRule::TimeBased {
        bucket_seconds: 10,
        points_per_bucket,
    }
}

fn per_30s(points_per_bucket: u32) -> MeasurementRule {
    MeasurementRule::TimeBased {
        bucket_seconds: 30,
        points_per_bucket,
    }
}

fn build_default_catalog_internal() -> Catalog {
    use ExerciseCategory::*;

    let entries: [(&str, &str, ExerciseCategory, MeasurementRule); 17] = [
        // Strength, scored per repetition
        ("squat", "Приседания", Strength, reps(2)),
        ("lunge", "Выпады", Strength, reps(3)),
        ("pushup", "Отжимания", Strength, reps(3)),
        ("pushup_knees", "Отжимания с колен", Strength, reps(2)),
        ("pushup_wall", "Отжимания от стены", Strength, reps(1)),
        ("glute_bridge", "Ягодичный мостик", Strength, reps(2)),
        ("crunch", "Скручивания", Strength, reps(1)),
        ("boat", "Лодочка", Strength, reps(2)),
        // Static holds
        ("plank", "Планка", StrengthEndurance, per_10s(4)),
        ("plank_easy", "Планка с колен", StrengthEndurance, per_10s(2)),
        ("wall_sit", "Стульчик у стены", StrengthEndurance, per_10s(3)),
        // Cardio
        ("run_in_place", "Бег на месте", Endurance, per_10s(2)),
        ("jumping_jack", "Джампинг-джек", Endurance, per_10s(3)),
        ("shadow_box", "Бой с тенью", Endurance, per_10s(3)),
        ("burpee", "Бёрпи", Endurance, per_10s(5)),
        // Stretching and breathing
        ("stretch", "Растяжка", Wellbeing, per_30s(1)),
        ("breathing", "Дыхательная практика", Wellbeing, per_30s(1)),
    ];

    let exercises = entries
        .into_iter()
        .map(|(id, label, category, rule)| {
            (
                id.to_string(),
                ExerciseConfig {
                    id: id.to_string(),
                    label: label.to_string(),
                    category,
                    rule,
                },
            )
        })
        .collect();

    Catalog { exercises }
}

impl Catalog {
    /// Build a catalog from explicit entries, rejecting duplicate ids
    pub fn from_entries(entries: Vec<ExerciseConfig>) -> Result<Self> {
        let mut exercises = HashMap::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id.clone();
            if exercises.insert(id.clone(), entry).is_some() {
                return Err(Error::CatalogValidation(format!(
                    "Duplicate exercise id '{}'",
                    id
                )));
            }
        }
        Ok(Self { exercises })
    }

    /// Look up an exercise by id
    pub fn lookup(&self, exercise_id: &str) -> Result<&ExerciseConfig> {
        self.exercises
            .get(exercise_id)
            .ok_or_else(|| Error::UnknownExercise(exercise_id.to_string()))
    }

    /// All entries ordered by id
    pub fn sorted(&self) -> Vec<&ExerciseConfig> {
        let mut entries: Vec<_> = self.exercises.values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if id.is_empty() || exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.label.is_empty() {
                errors.push(format!("Exercise '{}' has empty label", id));
            }
            if let MeasurementRule::TimeBased { bucket_seconds, .. } = exercise.rule {
                if bucket_seconds == 0 {
                    errors.push(format!(
                        "Exercise '{}' is time-based but has a zero bucket size",
                        id
                    ));
                }
            }
        }

        for category in ExerciseCategory::ALL {
            if !self.exercises.values().any(|e| e.category == category) {
                errors.push(format!("Catalog has no {} exercises", category.as_str()));
            }
        }

        errors
    }
}
