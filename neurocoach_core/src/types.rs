//! Core domain types shared across the coaching engine.
//!
//! This module defines:
//! - Exercise catalog entries and their measurement rules
//! - Score inputs and results
//! - Vibe modes, coach styles and step difficulty tiers

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Exercise Types
// ============================================================================

/// Which fitness metric an exercise trains
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    StrengthEndurance,
    Endurance,
    Wellbeing,
}

impl ExerciseCategory {
    pub const ALL: [ExerciseCategory; 4] = [
        ExerciseCategory::Strength,
        ExerciseCategory::StrengthEndurance,
        ExerciseCategory::Endurance,
        ExerciseCategory::Wellbeing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::Strength => "strength",
            ExerciseCategory::StrengthEndurance => "strength_endurance",
            ExerciseCategory::Endurance => "endurance",
            ExerciseCategory::Wellbeing => "wellbeing",
        }
    }
}

/// How an exercise is measured and converted into points
///
/// The variant fixes which request field is required: repetition-based
/// exercises need `reps`, time-based ones need `seconds`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "unit")]
pub enum MeasurementRule {
    /// Points for every completed repetition
    #[serde(rename = "reps")]
    RepBased { points_per_rep: u32 },
    /// Points for every fully completed bucket of seconds
    #[serde(rename = "time")]
    TimeBased {
        bucket_seconds: u32,
        points_per_bucket: u32,
    },
}

impl MeasurementRule {
    /// Name of the request field this rule consumes
    pub fn field_name(&self) -> &'static str {
        match self {
            MeasurementRule::RepBased { .. } => "reps",
            MeasurementRule::TimeBased { .. } => "seconds",
        }
    }
}

/// A catalog entry describing one scorable exercise
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub id: String,
    pub label: String,
    pub category: ExerciseCategory,
    pub rule: MeasurementRule,
}

/// The complete exercise catalog, keyed by exercise id
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: std::collections::HashMap<String, ExerciseConfig>,
}

// ============================================================================
// Scoring Types
// ============================================================================

/// A completed exercise as reported by the caller
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ScoreInput {
    #[serde(alias = "exercise_id")]
    pub exercise_slug: String,
    #[serde(default)]
    pub reps: Option<i64>,
    #[serde(default)]
    pub seconds: Option<i64>,
}

impl ScoreInput {
    pub fn reps(exercise: impl Into<String>, reps: i64) -> Self {
        Self {
            exercise_slug: exercise.into(),
            reps: Some(reps),
            seconds: None,
        }
    }

    pub fn seconds(exercise: impl Into<String>, seconds: i64) -> Self {
        Self {
            exercise_slug: exercise.into(),
            reps: None,
            seconds: Some(seconds),
        }
    }
}

/// Points awarded for a single exercise call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreResult {
    pub exercise_id: String,
    pub category: ExerciseCategory,
    /// Repetitions or whole time buckets that were counted
    pub units: u64,
    pub points: u64,
}

// ============================================================================
// Vibe and Coaching Types
// ============================================================================

/// Emotional/energy state that drives workout parameters
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VibeMode {
    AntiStress,
    Rage,
    Boost,
    Neutral,
}

impl VibeMode {
    pub const ALL: [VibeMode; 4] = [
        VibeMode::AntiStress,
        VibeMode::Rage,
        VibeMode::Boost,
        VibeMode::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VibeMode::AntiStress => "anti_stress",
            VibeMode::Rage => "rage",
            VibeMode::Boost => "boost",
            VibeMode::Neutral => "neutral",
        }
    }

    /// Parse a wire identifier, returning None for anything unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "anti_stress" => Some(VibeMode::AntiStress),
            "rage" => Some(VibeMode::Rage),
            "boost" => Some(VibeMode::Boost),
            "neutral" => Some(VibeMode::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for VibeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persona the coach speaks with
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CoachStyle {
    Strict,
    Soft,
    Comedy,
    Anime,
    Balanced,
}

impl CoachStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoachStyle::Strict => "strict",
            CoachStyle::Soft => "soft",
            CoachStyle::Comedy => "comedy",
            CoachStyle::Anime => "anime",
            CoachStyle::Balanced => "balanced",
        }
    }

    /// Parse a style name; unknown names fall back to `Balanced`
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "strict" => CoachStyle::Strict,
            "soft" => CoachStyle::Soft,
            "comedy" => CoachStyle::Comedy,
            "anime" => CoachStyle::Anime,
            _ => CoachStyle::Balanced,
        }
    }
}

impl fmt::Display for CoachStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty tier of a single workout step
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Parse a tier name; anything unrecognized is `Medium`
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}
