//! 30-day outcome forecast under two adherence scenarios.
//!
//! The fallback uses fixed percentage buckets selected by the consistency
//! level; the pessimistic scenario does not depend on the inputs.

use crate::llm::{parse_json_reply, ChatOptions, LlmError};
use crate::pipeline::Prompt;
use crate::profile::WorkoutRecord;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Consistency above this selects the high-adherence optimistic bucket
pub const HIGH_ADHERENCE_THRESHOLD: f64 = 0.7;
pub const FORECAST_DAYS: u32 = 30;

/// Current fitness snapshot
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BaselineStats {
    #[serde(default = "default_stat")]
    pub endurance: f64,
    #[serde(default = "default_stat")]
    pub strength: f64,
    #[serde(default = "default_stat")]
    pub flexibility: f64,
    #[serde(default = "default_stat")]
    pub wellbeing: f64,
    #[serde(default)]
    pub consistency: f64,
}

fn default_stat() -> f64 {
    50.0
}

impl Default for BaselineStats {
    fn default() -> Self {
        Self {
            endurance: default_stat(),
            strength: default_stat(),
            flexibility: default_stat(),
            wellbeing: default_stat(),
            consistency: 0.0,
        }
    }
}

/// Incoming forecast request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub current_stats: BaselineStats,
    #[serde(default)]
    pub planned_workouts: Vec<WorkoutRecord>,
    #[serde(default = "default_consistency")]
    pub consistency_level: f64,
    #[serde(default)]
    pub user_goals: Vec<String>,
}

fn default_consistency() -> f64 {
    0.7
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            current_stats: BaselineStats::default(),
            planned_workouts: Vec::new(),
            consistency_level: default_consistency(),
            user_goals: Vec::new(),
        }
    }
}

impl ForecastRequest {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.consistency_level) {
            return Err(Error::Validation(format!(
                "consistency_level must be between 0 and 1 (got {})",
                self.consistency_level
            )));
        }
        Ok(())
    }
}

/// Percentage changes per metric
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatDeltas {
    #[serde(with = "signed_percent")]
    pub endurance: i32,
    #[serde(with = "signed_percent")]
    pub strength: i32,
    #[serde(with = "signed_percent")]
    pub flexibility: i32,
    #[serde(with = "signed_percent")]
    pub wellbeing: i32,
}

impl StatDeltas {
    pub const fn new(endurance: i32, strength: i32, flexibility: i32, wellbeing: i32) -> Self {
        Self {
            endurance,
            strength,
            flexibility,
            wellbeing,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OptimisticScenario {
    pub description: String,
    pub improvements: StatDeltas,
    #[serde(default)]
    pub key_achievements: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PessimisticScenario {
    pub description: String,
    pub changes: StatDeltas,
    #[serde(default)]
    pub risks: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Comparison {
    #[serde(default)]
    pub difference_description: String,
    #[serde(default)]
    pub motivational_message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Forecast answer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ForecastResult {
    pub baseline: BaselineStats,
    pub optimistic_scenario: OptimisticScenario,
    pub pessimistic_scenario: PessimisticScenario,
    pub comparison: Comparison,
    pub key_milestones: Vec<Milestone>,
    pub recommendations: Vec<String>,
}

const HIGH_ADHERENCE: StatDeltas = StatDeltas::new(25, 20, 15, 30);
const MODERATE_ADHERENCE: StatDeltas = StatDeltas::new(15, 10, 10, 20);
const SKIPPING: StatDeltas = StatDeltas::new(-10, -15, -5, -20);

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn milestone(day: u32, title: &str, description: &str) -> Milestone {
    Milestone {
        day,
        title: title.into(),
        description: description.into(),
    }
}

/// Deterministic forecast
pub fn fallback_forecast(current_stats: &BaselineStats, consistency: f64) -> ForecastResult {
    let optimistic = if consistency > HIGH_ADHERENCE_THRESHOLD {
        OptimisticScenario {
            description: "Отличные результаты при регулярных тренировках".into(),
            improvements: HIGH_ADHERENCE,
            key_achievements: strings(&[
                "Улучшение выносливости",
                "Увеличение силы",
                "Повышение энергии",
            ]),
        }
    } else {
        OptimisticScenario {
            description: "Хороший прогресс при умеренной регулярности".into(),
            improvements: MODERATE_ADHERENCE,
            key_achievements: strings(&["Стабильный прогресс", "Улучшение самочувствия"]),
        }
    };

    ForecastResult {
        baseline: current_stats.clone(),
        optimistic_scenario: optimistic,
        pessimistic_scenario: PessimisticScenario {
            description: "Потеря прогресса при пропусках тренировок".into(),
            changes: SKIPPING,
            risks: strings(&[
                "Потеря мотивации",
                "Снижение формы",
                "Возврат к старым привычкам",
            ]),
        },
        comparison: Comparison {
            difference_description: "Разница в 35-40% в показателях".into(),
            motivational_message: "Регулярность - ключ к успеху!".into(),
        },
        key_milestones: vec![
            milestone(7, "Первая неделя", "Адаптация организма"),
            milestone(14, "Две недели", "Первые заметные изменения"),
            milestone(30, "Месяц", "Значительное улучшение формы"),
        ],
        recommendations: strings(&[
            "Тренируйтесь регулярно",
            "Отслеживайте прогресс",
            "Не пропускайте тренировки",
        ]),
    }
}

/// Model prompt for a forecast
pub fn prompt(request: &ForecastRequest) -> Prompt {
    let stats = &request.current_stats;
    let goals = if request.user_goals.is_empty() {
        "общее улучшение формы".to_string()
    } else {
        request.user_goals.join(", ")
    };

    let content = format!(
        r#"Создай прогноз спортивной формы на {days} дней.

Текущие показатели:
выносливость {e:.0}, сила {s:.0}, гибкость {f:.0}, самочувствие {w:.0}

Планируемые тренировки: {planned} тренировок
Уровень регулярности: {consistency:.0}%
Цели: {goals}

Верни JSON с двумя сценариями:
{{
  "optimistic_scenario": {{
    "description": "если тренироваться по плану",
    "improvements": {{"endurance": "+X%", "strength": "+X%", "flexibility": "+X%", "wellbeing": "+X%"}},
    "key_achievements": ["достижение 1", "достижение 2"]
  }},
  "pessimistic_scenario": {{
    "description": "если пропускать тренировки",
    "changes": {{"endurance": "-X%", "strength": "-X%", "flexibility": "-X%", "wellbeing": "-X%"}},
    "risks": ["риск 1", "риск 2"]
  }},
  "comparison": {{
    "difference_description": "разница между сценариями",
    "motivational_message": "мотивационное сообщение"
  }},
  "key_milestones": [
    {{"day": 7, "title": "первая неделя", "description": "описание"}}
  ],
  "recommendations": ["рекомендация 1", "рекомендация 2"]
}}"#,
        days = FORECAST_DAYS,
        e = stats.endurance,
        s = stats.strength,
        f = stats.flexibility,
        w = stats.wellbeing,
        planned = request.planned_workouts.len(),
        consistency = request.consistency_level * 100.0,
        goals = goals,
    );

    Prompt::user(content, ChatOptions::with_temperature(0.4))
}

#[derive(Debug, Deserialize)]
struct ModelForecast {
    optimistic_scenario: OptimisticScenario,
    pessimistic_scenario: PessimisticScenario,
    #[serde(default)]
    comparison: Comparison,
    #[serde(default)]
    key_milestones: Vec<Milestone>,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Validate a model reply into a forecast for the given baseline
pub fn parse_reply(
    current_stats: &BaselineStats,
    reply: &str,
) -> std::result::Result<ForecastResult, LlmError> {
    let raw: ModelForecast = parse_json_reply(reply)?;

    if let Some(m) = raw
        .key_milestones
        .iter()
        .find(|m| m.day == 0 || m.day > FORECAST_DAYS)
    {
        return Err(LlmError::Parse(format!(
            "milestone '{}' on day {} is outside the forecast window",
            m.title, m.day
        )));
    }

    let mut key_milestones = raw.key_milestones;
    key_milestones.sort_by_key(|m| m.day);

    Ok(ForecastResult {
        baseline: current_stats.clone(),
        optimistic_scenario: raw.optimistic_scenario,
        pessimistic_scenario: raw.pessimistic_scenario,
        comparison: raw.comparison,
        key_milestones,
        recommendations: raw.recommendations,
    })
}

/// Integer percentages on the wire as `"+25%"`; accepts numbers on input.
mod signed_percent {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:+}%", value))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        let value = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => {
                let cleaned = s.trim().trim_end_matches('%').trim();
                let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned);
                cleaned
                    .parse::<f64>()
                    .map_err(|_| de::Error::custom(format!("invalid percentage '{}'", s)))?
            }
        };

        if !value.is_finite() || value.abs() > 1000.0 {
            return Err(de::Error::custom(format!(
                "percentage out of range: {}",
                value
            )));
        }
        Ok(value.round() as i32)
    }
}
