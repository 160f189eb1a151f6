//! Vibe classification: free text or three sliders to a training mode.
//!
//! Text goes to the model first and falls back to a keyword heuristic.
//! Sliders are classified deterministically and never reach the model.

use crate::llm::{lenient, parse_json_reply, ChatOptions, LlmError};
use crate::pipeline::Prompt;
use crate::{CoachStyle, Error, Result, VibeMode};
use serde::{Deserialize, Serialize};

const FATIGUE_WORDS: &[&str] = &[
    "устал", "усталость", "утомлен", "сон", "tired", "exhausted",
];
const ANGER_WORDS: &[&str] = &[
    "злой", "агрессия", "раздражен", "злость", "angry", "furious",
];
const ENERGY_WORDS: &[&str] = &[
    "энергия", "бодр", "отлично", "мотивация", "energy", "pumped",
];

/// Inclusive slider range
pub const SLIDER_MIN: i64 = 1;
pub const SLIDER_MAX: i64 = 5;

/// Incoming assessment request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VibeRequest {
    #[serde(default)]
    pub user_input: Option<String>,
    #[serde(default)]
    pub fatigue_level: Option<i64>,
    #[serde(default)]
    pub stress_level: Option<i64>,
    #[serde(default)]
    pub motivation_level: Option<i64>,
}

/// Validated slider values, each in 1..=5
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sliders {
    pub fatigue: u8,
    pub stress: u8,
    pub motivation: u8,
}

impl Sliders {
    pub fn new(fatigue: i64, stress: i64, motivation: i64) -> Result<Self> {
        Ok(Self {
            fatigue: slider("fatigue_level", fatigue)?,
            stress: slider("stress_level", stress)?,
            motivation: slider("motivation_level", motivation)?,
        })
    }
}

fn slider(name: &str, value: i64) -> Result<u8> {
    if !(SLIDER_MIN..=SLIDER_MAX).contains(&value) {
        return Err(Error::Validation(format!(
            "{} must be between {} and {} (got {})",
            name, SLIDER_MIN, SLIDER_MAX, value
        )));
    }
    Ok(value as u8)
}

/// What the classifier should work from
#[derive(Clone, Debug, PartialEq)]
pub enum VibeInput {
    Text(String),
    Sliders(Sliders),
}

impl VibeRequest {
    /// Non-blank text wins; otherwise all three sliders are required
    pub fn into_input(self) -> Result<VibeInput> {
        if let Some(text) = self.user_input.filter(|t| !t.trim().is_empty()) {
            return Ok(VibeInput::Text(text));
        }

        match (self.fatigue_level, self.stress_level, self.motivation_level) {
            (Some(f), Some(s), Some(m)) => Ok(VibeInput::Sliders(Sliders::new(f, s, m)?)),
            _ => Err(Error::Validation(
                "either user_input or all of fatigue_level, stress_level, motivation_level \
                 must be provided"
                    .into(),
            )),
        }
    }
}

/// The classifier's answer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VibeAssessment {
    pub vibe_mode: VibeMode,
    pub confidence: f64,
    pub mood_description: String,
    pub recommended_intensity: f64,
    pub coach_style_suggestion: CoachStyle,
    pub workout_duration_suggestion: u32,
}

/// Fixed parameters attached to each mode by the deterministic paths
fn mode_profile(mode: VibeMode) -> VibeAssessment {
    let (confidence, description, intensity, style, duration) = match mode {
        VibeMode::AntiStress => (0.8, "Обнаружена усталость", 0.3, CoachStyle::Soft, 20),
        VibeMode::Rage => (0.75, "Обнаружен стресс", 0.8, CoachStyle::Strict, 30),
        VibeMode::Boost => (0.85, "Высокий уровень энергии", 0.9, CoachStyle::Comedy, 45),
        VibeMode::Neutral => (0.6, "Нормальное состояние", 0.6, CoachStyle::Balanced, 30),
    };

    VibeAssessment {
        vibe_mode: mode,
        confidence,
        mood_description: description.to_string(),
        recommended_intensity: intensity,
        coach_style_suggestion: style,
        workout_duration_suggestion: duration,
    }
}

/// Keyword heuristic over lowercased text
///
/// Checked in order: fatigue, anger, energy; no match is neutral.
pub fn classify_text(text: &str) -> VibeAssessment {
    let lower = text.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let mode = if contains_any(FATIGUE_WORDS) {
        VibeMode::AntiStress
    } else if contains_any(ANGER_WORDS) {
        VibeMode::Rage
    } else if contains_any(ENERGY_WORDS) {
        VibeMode::Boost
    } else {
        VibeMode::Neutral
    };

    tracing::debug!("Keyword heuristic selected {}", mode);
    mode_profile(mode)
}

/// Slider mapping
///
/// 1. fatigue >= 4 and (stress >= 4 or motivation <= 2) -> anti_stress
/// 2. stress >= 4 -> rage
/// 3. motivation >= 4 and fatigue <= 2 -> boost
/// 4. otherwise neutral
pub fn classify_sliders(sliders: Sliders) -> VibeAssessment {
    let Sliders {
        fatigue,
        stress,
        motivation,
    } = sliders;

    let mode = if fatigue >= 4 && (stress >= 4 || motivation <= 2) {
        VibeMode::AntiStress
    } else if stress >= 4 {
        VibeMode::Rage
    } else if motivation >= 4 && fatigue <= 2 {
        VibeMode::Boost
    } else {
        VibeMode::Neutral
    };

    tracing::debug!(
        "Sliders fatigue={} stress={} motivation={} selected {}",
        fatigue,
        stress,
        motivation,
        mode
    );
    mode_profile(mode)
}

/// Model prompt for the text path
pub fn prompt(text: &str) -> Prompt {
    let content = format!(
        r#"Проанализируй состояние пользователя и определи режим тренировки:
1. anti_stress - если усталость, стресс, нужна мягкая восстановительная тренировка
2. rage - если агрессия, злость, нужна интенсивная силовая/кардио нагрузка
3. boost - если хорошее настроение, энергия, можно дать сложную тренировку
4. neutral - если нормальное состояние, стандартная тренировка

Описание пользователя: {}

Верни JSON: {{
  "mode": "anti_stress|rage|boost|neutral",
  "confidence": 0.85,
  "description": "краткое описание состояния",
  "recommended_intensity": 0.7,
  "coach_style": "strict|soft|comedy|anime|balanced",
  "workout_duration": 30
}}"#,
        text
    );

    Prompt::user(content, ChatOptions::with_temperature(0.3))
}

#[derive(Debug, Deserialize)]
struct ModelVibe {
    mode: Option<String>,
    confidence: Option<f64>,
    description: Option<String>,
    recommended_intensity: Option<f64>,
    coach_style: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_whole_u32")]
    workout_duration: Option<u32>,
}

/// Validate a model reply into an assessment
pub fn parse_reply(reply: &str) -> std::result::Result<VibeAssessment, LlmError> {
    let raw: ModelVibe = parse_json_reply(reply)?;

    let vibe_mode = match raw.mode.as_deref() {
        None => VibeMode::Neutral,
        Some(mode) => VibeMode::parse(mode)
            .ok_or_else(|| LlmError::Parse(format!("unknown vibe mode '{}'", mode)))?,
    };

    let duration = raw.workout_duration.unwrap_or(30);
    if duration == 0 {
        return Err(LlmError::Parse(format!(
            "workout_duration must be positive (got {})",
            duration
        )));
    }

    Ok(VibeAssessment {
        vibe_mode,
        confidence: unit_interval("confidence", raw.confidence.unwrap_or(0.7))?,
        mood_description: raw
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "Состояние определено".to_string()),
        recommended_intensity: unit_interval(
            "recommended_intensity",
            raw.recommended_intensity.unwrap_or(0.6),
        )?,
        coach_style_suggestion: raw
            .coach_style
            .as_deref()
            .map(CoachStyle::parse_lenient)
            .unwrap_or(CoachStyle::Balanced),
        workout_duration_suggestion: duration,
    })
}

/// Clamp a model-provided fraction into [0, 1]
pub(crate) fn unit_interval(name: &str, value: f64) -> std::result::Result<f64, LlmError> {
    if !value.is_finite() {
        return Err(LlmError::Parse(format!("{} is not a finite number", name)));
    }
    Ok(value.clamp(0.0, 1.0))
}
