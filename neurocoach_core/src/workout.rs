//! Three-phase workout plans (warm-up, main block, cool-down).
//!
//! The fallback plan is intentionally minimal: it guarantees structure,
//! not workout quality.

use crate::llm::{lenient, parse_json_reply, ChatOptions, LlmError};
use crate::pipeline::{Generated, Prompt};
use crate::vibe::unit_interval;
use crate::{Difficulty, Error, Result, VibeMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_DURATION_MIN: u32 = 10;
pub const MAX_DURATION_MIN: u32 = 90;

/// Intensity used for modes the generator does not recognize
const DEFAULT_INTENSITY: f64 = 0.6;
const CALORIES_PER_MINUTE: u32 = 8;

/// Incoming workout request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutRequest {
    pub vibe_mode: String,
    #[serde(default = "default_duration")]
    pub duration_min: u32,
    #[serde(default = "default_fitness_level")]
    pub fitness_level: String,
    #[serde(default = "default_equipment")]
    pub equipment: Vec<String>,
}

fn default_duration() -> u32 {
    30
}

fn default_fitness_level() -> String {
    "intermediate".into()
}

fn default_equipment() -> Vec<String> {
    vec!["bodyweight".into()]
}

impl WorkoutRequest {
    pub fn new(vibe_mode: impl Into<String>, duration_min: u32) -> Self {
        Self {
            vibe_mode: vibe_mode.into(),
            duration_min,
            fitness_level: default_fitness_level(),
            equipment: default_equipment(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_DURATION_MIN..=MAX_DURATION_MIN).contains(&self.duration_min) {
            return Err(Error::Validation(format!(
                "duration_min must be between {} and {} (got {})",
                MIN_DURATION_MIN, MAX_DURATION_MIN, self.duration_min
            )));
        }
        if self.vibe_mode.trim().is_empty() {
            return Err(Error::Validation("vibe_mode must not be empty".into()));
        }
        Ok(())
    }
}

/// One exercise step in a plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseStep {
    pub name: String,
    #[serde(deserialize_with = "lenient::whole_u32")]
    pub duration_sec: u32,
    pub instructions: String,
    #[serde(default, deserialize_with = "lenient::difficulty")]
    pub difficulty: Difficulty,
}

/// Plan body, independent of request metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub vibe_mode: String,
    pub intensity: f64,
    pub estimated_calories: u32,
    pub warm_up: Vec<ExerciseStep>,
    pub main_block: Vec<ExerciseStep>,
    pub cool_down: Vec<ExerciseStep>,
}

impl WorkoutPlan {
    /// Sum of all step durations
    pub fn total_seconds(&self) -> u64 {
        self.warm_up
            .iter()
            .chain(&self.main_block)
            .chain(&self.cool_down)
            .map(|s| u64::from(s.duration_sec))
            .sum()
    }
}

/// Plan plus response metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeneratedWorkout {
    pub workout_id: String,
    pub total_duration_min: u32,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub plan: WorkoutPlan,
}

impl GeneratedWorkout {
    pub fn wrap(request: &WorkoutRequest, plan: Generated<WorkoutPlan>) -> Generated<Self> {
        plan.map(|plan| Self {
            workout_id: format!("workout_{}", Uuid::new_v4().simple()),
            total_duration_min: request.duration_min,
            generated_at: Utc::now(),
            plan,
        })
    }
}

/// Intensity attached to a mode identifier
pub fn intensity_for(vibe_mode: &str) -> f64 {
    match VibeMode::parse(vibe_mode) {
        Some(VibeMode::AntiStress) => 0.3,
        Some(VibeMode::Rage) => 0.8,
        Some(VibeMode::Boost) => 0.9,
        Some(VibeMode::Neutral) => 0.6,
        None => DEFAULT_INTENSITY,
    }
}

/// Recognized modes echo in their canonical spelling; others pass through
fn canonical_mode(vibe_mode: &str) -> String {
    VibeMode::parse(vibe_mode)
        .map(|mode| mode.as_str().to_string())
        .unwrap_or_else(|| vibe_mode.to_string())
}

/// Deterministic plan for any mode and duration
pub fn fallback_plan(vibe_mode: &str, duration_min: u32) -> WorkoutPlan {
    WorkoutPlan {
        vibe_mode: canonical_mode(vibe_mode),
        intensity: intensity_for(vibe_mode),
        estimated_calories: duration_min.saturating_mul(CALORIES_PER_MINUTE),
        warm_up: vec![ExerciseStep {
            name: "Разминка суставов".into(),
            duration_sec: 300,
            instructions: "Вращайте всеми суставами по 10 раз каждым".into(),
            difficulty: Difficulty::Easy,
        }],
        main_block: vec![ExerciseStep {
            name: "Основное упражнение".into(),
            duration_sec: duration_min.saturating_mul(30),
            instructions: "Выполняйте в умеренном темпе".into(),
            difficulty: Difficulty::Medium,
        }],
        cool_down: vec![ExerciseStep {
            name: "Растяжка".into(),
            duration_sec: 180,
            instructions: "Медленно растяните все мышцы".into(),
            difficulty: Difficulty::Easy,
        }],
    }
}

/// Model prompt for a plan
pub fn prompt(request: &WorkoutRequest) -> Prompt {
    let content = format!(
        r#"Сгенерируй план тренировки на {duration} минут для режима: {mode}
Уровень подготовки: {level}
Доступный инвентарь: {equipment}

Режимы:
- anti_stress: мягкая восстановительная тренировка, растяжка, дыхательные упражнения
- rage: интенсивная силовая/кардио нагрузка, высокая интенсивность
- boost: энергичная тренировка со сложными упражнениями
- neutral: сбалансированная тренировка, средняя интенсивность

Верни JSON структуру тренировки:
{{
  "intensity": 0.7,
  "estimated_calories": 250,
  "warm_up": [
    {{"name": "название", "duration_sec": 180, "instructions": "описание", "difficulty": "easy"}}
  ],
  "main_block": [
    {{"name": "название", "duration_sec": 300, "instructions": "описание", "difficulty": "medium"}}
  ],
  "cool_down": [
    {{"name": "название", "duration_sec": 180, "instructions": "описание", "difficulty": "easy"}}
  ]
}}"#,
        duration = request.duration_min,
        mode = request.vibe_mode,
        level = request.fitness_level,
        equipment = request.equipment.join(", "),
    );

    Prompt::user(content, ChatOptions::with_temperature(0.4))
}

#[derive(Debug, Deserialize)]
struct ModelPlan {
    intensity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_whole_u32")]
    estimated_calories: Option<u32>,
    warm_up: Option<Vec<ExerciseStep>>,
    main_block: Option<Vec<ExerciseStep>>,
    cool_down: Option<Vec<ExerciseStep>>,
}

/// Validate a model reply into a plan
///
/// All three phases must be present and every step must have a positive
/// duration; anything else is a parse failure.
pub fn parse_reply(
    request: &WorkoutRequest,
    reply: &str,
) -> std::result::Result<WorkoutPlan, LlmError> {
    let raw: ModelPlan = parse_json_reply(reply)?;

    let warm_up = phase("warm_up", raw.warm_up)?;
    let main_block = phase("main_block", raw.main_block)?;
    let cool_down = phase("cool_down", raw.cool_down)?;

    if main_block.is_empty() {
        return Err(LlmError::Parse("main_block is empty".into()));
    }

    Ok(WorkoutPlan {
        vibe_mode: canonical_mode(&request.vibe_mode),
        intensity: unit_interval("intensity", raw.intensity.unwrap_or(DEFAULT_INTENSITY))?,
        estimated_calories: raw.estimated_calories.unwrap_or(200),
        warm_up,
        main_block,
        cool_down,
    })
}

fn phase(
    name: &str,
    steps: Option<Vec<ExerciseStep>>,
) -> std::result::Result<Vec<ExerciseStep>, LlmError> {
    let steps = steps.ok_or_else(|| LlmError::Parse(format!("missing '{}' array", name)))?;
    if let Some(step) = steps.iter().find(|s| s.duration_sec == 0) {
        return Err(LlmError::Parse(format!(
            "step '{}' in {} has zero duration",
            step.name, name
        )));
    }
    if let Some(step) = steps.iter().find(|s| s.name.trim().is_empty()) {
        return Err(LlmError::Parse(format!(
            "step with empty name in {} ({} s)",
            name, step.duration_sec
        )));
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rage_fallback() {
        let plan = fallback_plan("rage", 30);
        assert_eq!(plan.intensity, 0.8);
        assert_eq!(plan.estimated_calories, 240);
        assert_eq!(plan.main_block.len(), 1);
        assert_eq!(plan.main_block[0].duration_sec, 900);
        assert_eq!(plan.warm_up[0].duration_sec, 300);
        assert_eq!(plan.cool_down[0].duration_sec, 180);
    }

    #[test]
    fn test_intensity_table() {
        assert_eq!(intensity_for("anti_stress"), 0.3);
        assert_eq!(intensity_for("boost"), 0.9);
        assert_eq!(intensity_for("neutral"), 0.6);
        assert_eq!(intensity_for("zen"), 0.6);
    }

    #[test]
    fn test_fallback_is_pure() {
        let a = serde_json::to_string(&fallback_plan("boost", 45)).unwrap();
        let b = serde_json::to_string(&fallback_plan("boost", 45)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_structure_for_all_durations() {
        for duration in MIN_DURATION_MIN..=MAX_DURATION_MIN {
            let plan = fallback_plan("neutral", duration);
            assert_eq!(plan.warm_up.len(), 1);
            assert_eq!(plan.main_block.len(), 1);
            assert_eq!(plan.cool_down.len(), 1);
            assert_eq!(plan.total_seconds(), 480 + u64::from(duration) * 30);
            assert!((0.0..=1.0).contains(&plan.intensity));
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(WorkoutRequest::new("rage", 30).validate().is_ok());
        assert!(matches!(
            WorkoutRequest::new("rage", 9).validate(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            WorkoutRequest::new("rage", 91).validate(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_request_defaults() {
        let request: WorkoutRequest = serde_json::from_str(r#"{"vibe_mode":"boost"}"#).unwrap();
        assert_eq!(request.duration_min, 30);
        assert_eq!(request.fitness_level, "intermediate");
        assert_eq!(request.equipment, vec!["bodyweight".to_string()]);
    }

    #[test]
    fn test_parse_valid_reply() {
        let request = WorkoutRequest::new("boost", 20);
        let reply = r#"Конечно! {"intensity": 0.85, "estimated_calories": 180,
            "warm_up": [{"name": "Прыжки", "duration_sec": 120, "instructions": "легко", "difficulty": "easy"}],
            "main_block": [{"name": "Бёрпи", "duration_sec": 600, "instructions": "быстро", "difficulty": "hard"},
                           {"name": "Планка", "duration_sec": 300, "instructions": "держать"}],
            "cool_down": []}"#;

        let plan = parse_reply(&request, reply).unwrap();
        assert_eq!(plan.vibe_mode, "boost");
        assert_eq!(plan.intensity, 0.85);
        assert_eq!(plan.main_block.len(), 2);
        assert_eq!(plan.main_block[0].difficulty, Difficulty::Hard);
        assert_eq!(plan.main_block[1].difficulty, Difficulty::Medium);
        assert!(plan.cool_down.is_empty());
    }

    #[test]
    fn test_parse_reply_tolerates_schema_drift() {
        let request = WorkoutRequest::new("rage", 30);
        let reply = r#"{"estimated_calories": 310.0, "warm_up": [], "cool_down": [],
            "main_block": [{"name": "x", "duration_sec": 60.0, "instructions": "y", "difficulty": "moderate"},
                           {"name": "z", "duration_sec": 45, "instructions": "w", "difficulty": null}]}"#;

        let plan = parse_reply(&request, reply).unwrap();
        assert_eq!(plan.estimated_calories, 310);
        assert_eq!(plan.main_block[0].duration_sec, 60);
        assert_eq!(plan.main_block[0].difficulty, Difficulty::Medium);
        assert_eq!(plan.main_block[1].difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_parse_rejects_fractional_duration() {
        let request = WorkoutRequest::new("rage", 30);
        let reply = r#"{"warm_up": [], "cool_down": [],
            "main_block": [{"name": "x", "duration_sec": 60.5, "instructions": "y"}]}"#;
        assert!(parse_reply(&request, reply).is_err());
    }

    #[test]
    fn test_vibe_mode_is_echoed_canonically() {
        assert_eq!(fallback_plan(" RAGE ", 30).vibe_mode, "rage");
        assert_eq!(fallback_plan(" RAGE ", 30).intensity, 0.8);
        assert_eq!(fallback_plan("zen", 30).vibe_mode, "zen");

        let request = WorkoutRequest::new("Boost", 20);
        let reply = r#"{"warm_up": [], "cool_down": [],
            "main_block": [{"name": "x", "duration_sec": 60, "instructions": "y"}]}"#;
        assert_eq!(parse_reply(&request, reply).unwrap().vibe_mode, "boost");
    }

    #[test]
    fn test_parse_rejects_missing_phase() {
        let request = WorkoutRequest::new("boost", 20);
        let reply = r#"{"warm_up": [], "main_block": [{"name": "x", "duration_sec": 60, "instructions": "y"}]}"#;
        assert!(parse_reply(&request, reply).is_err());
    }

    #[test]
    fn test_parse_rejects_zero_duration_step() {
        let request = WorkoutRequest::new("boost", 20);
        let reply = r#"{"warm_up": [], "cool_down": [],
            "main_block": [{"name": "x", "duration_sec": 0, "instructions": "y"}]}"#;
        assert!(parse_reply(&request, reply).is_err());
    }

    #[test]
    fn test_parse_rejects_negative_calories() {
        let request = WorkoutRequest::new("boost", 20);
        let reply = r#"{"estimated_calories": -5, "warm_up": [], "cool_down": [],
            "main_block": [{"name": "x", "duration_sec": 60, "instructions": "y"}]}"#;
        assert!(parse_reply(&request, reply).is_err());
    }

    #[test]
    fn test_wrap_adds_metadata() {
        let request = WorkoutRequest::new("rage", 30);
        let wrapped = GeneratedWorkout::wrap(
            &request,
            Generated::fallback(fallback_plan("rage", 30)),
        );
        assert!(wrapped.value.workout_id.starts_with("workout_"));
        assert_eq!(wrapped.value.total_duration_min, 30);

        let json = serde_json::to_value(&wrapped).unwrap();
        assert_eq!(json["estimated_calories"], 240);
        assert_eq!(json["source"], "fallback");
        assert!(json["warm_up"].is_array());
    }
}
