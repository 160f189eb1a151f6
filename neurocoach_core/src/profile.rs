//! Behavioral profile from workout history.
//!
//! The fallback only distinguishes "no history" from "some history". Finer
//! archetypes come from the model path.

use crate::llm::{parse_json_reply, ChatOptions, LlmError};
use crate::pipeline::Prompt;
use serde::{Deserialize, Serialize};

/// One past workout as reported by the caller
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub duration_min: f64,
    #[serde(default)]
    pub intensity: Option<f64>,
    #[serde(default)]
    pub exercise: Option<String>,
}

/// Incoming analysis request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub workout_history: Vec<WorkoutRecord>,
    #[serde(default)]
    pub user_goals: Vec<String>,
}

/// Aggregate statistics over a history
#[derive(Clone, Debug, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
    pub avg_duration_min: f64,
}

/// Recommended training schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct TrainingSchedule {
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub intensity: String,
    #[serde(default)]
    pub coach_style: String,
}

/// Profile classification result
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileAnalysis {
    pub user_type: String,
    pub analysis: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub optimal_training_schedule: TrainingSchedule,
}

/// Count, completion rate and average duration
pub fn summarize(history: &[WorkoutRecord]) -> HistorySummary {
    let total = history.len();
    let completed = history.iter().filter(|w| w.completed).count();
    let (completion_rate, avg_duration_min) = if total == 0 {
        (0.0, 0.0)
    } else {
        let duration: f64 = history.iter().map(|w| w.duration_min.max(0.0)).sum();
        (completed as f64 / total as f64, duration / total as f64)
    };

    HistorySummary {
        total,
        completed,
        completion_rate,
        avg_duration_min,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Two-bucket deterministic profile
pub fn fallback_analysis(history: &[WorkoutRecord]) -> ProfileAnalysis {
    if history.is_empty() {
        return ProfileAnalysis {
            user_type: "новичок".into(),
            analysis: "Пользователь только начинает свой спортивный путь.".into(),
            strengths: strings(&["готовность начать"]),
            weaknesses: strings(&["нет тренировочного опыта"]),
            recommendations: strings(&[
                "Начните с 3 тренировок в неделю по 30 минут",
                "Сфокусируйтесь на базовых упражнениях",
                "Отслеживайте прогресс",
            ]),
            optimal_training_schedule: TrainingSchedule {
                frequency: "3 раза в неделю".into(),
                duration: "30 минут".into(),
                intensity: "умеренная".into(),
                coach_style: "balanced".into(),
            },
        };
    }

    ProfileAnalysis {
        user_type: "активный пользователь".into(),
        analysis: "Регулярные тренировки с хорошей вовлеченностью.".into(),
        strengths: strings(&["регулярность", "настойчивость"]),
        weaknesses: strings(&["возможно требуется разнообразие"]),
        recommendations: strings(&[
            "Добавьте новые виды упражнений",
            "Попробуйте разные стили тренировок",
            "Увеличьте интенсивность постепенно",
        ]),
        optimal_training_schedule: TrainingSchedule {
            frequency: "4 раза в неделю".into(),
            duration: "40 минут".into(),
            intensity: "средняя-высокая".into(),
            coach_style: "balanced".into(),
        },
    }
}

fn describe_history(summary: &HistorySummary) -> String {
    if summary.total == 0 {
        return "История тренировок пуста.".into();
    }
    format!(
        "Всего тренировок: {}\nЗавершено: {} ({:.0}%)\nСредняя длительность: {:.0} минут",
        summary.total,
        summary.completed,
        summary.completion_rate * 100.0,
        summary.avg_duration_min
    )
}

/// Model prompt for a profile
pub fn prompt(request: &ProfileRequest) -> Prompt {
    let summary = summarize(&request.workout_history);
    let goals = if request.user_goals.is_empty() {
        "не указаны".to_string()
    } else {
        request.user_goals.join(", ")
    };

    let content = format!(
        r#"Проанализируй спортивный профиль пользователя на основе истории тренировок.

История тренировок:
{history}

Цели пользователя: {goals}

Проанализируй и верни JSON:
{{
  "user_type": "тип пользователя (например: новичок, энтузиаст, спортсмен)",
  "analysis": "анализ тренировочных привычек (2-3 предложения)",
  "strengths": ["сильная сторона 1", "сильная сторона 2"],
  "weaknesses": ["слабая сторона 1", "слабая сторона 2"],
  "recommendations": ["рекомендация 1", "рекомендация 2", "рекомендация 3"],
  "optimal_training_schedule": {{
    "frequency": "рекомендуемая частота",
    "duration": "рекомендуемая длительность",
    "intensity": "рекомендуемая интенсивность",
    "coach_style": "рекомендуемый стиль тренера"
  }}
}}"#,
        history = describe_history(&summary),
        goals = goals,
    );

    Prompt::user(content, ChatOptions::with_temperature(0.3))
}

/// Validate a model reply into a profile
pub fn parse_reply(reply: &str) -> Result<ProfileAnalysis, LlmError> {
    let analysis: ProfileAnalysis = parse_json_reply(reply)?;
    if analysis.user_type.trim().is_empty() {
        return Err(LlmError::Parse("user_type is empty".into()));
    }
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(completed: bool, duration_min: f64) -> WorkoutRecord {
        WorkoutRecord {
            completed,
            duration_min,
            ..WorkoutRecord::default()
        }
    }

    #[test]
    fn test_empty_history_is_beginner() {
        let result = fallback_analysis(&[]);
        assert_eq!(result.user_type, "новичок");
        assert_eq!(result.optimal_training_schedule.frequency, "3 раза в неделю");
        assert_eq!(result.optimal_training_schedule.duration, "30 минут");
    }

    #[test]
    fn test_any_history_is_active() {
        let result = fallback_analysis(&[record(false, 5.0)]);
        assert_eq!(result.user_type, "активный пользователь");
        assert_eq!(result.optimal_training_schedule.frequency, "4 раза в неделю");
        assert_eq!(result.optimal_training_schedule.duration, "40 минут");
    }

    #[test]
    fn test_summarize() {
        let history = vec![record(true, 30.0), record(true, 40.0), record(false, 20.0), record(false, 10.0)];
        let summary = summarize(&history);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.completion_rate, 0.5);
        assert_eq!(summary.avg_duration_min, 25.0);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_rate, 0.0);
    }

    #[test]
    fn test_history_ignores_unknown_fields() {
        let history: Vec<WorkoutRecord> = serde_json::from_str(
            r#"[{"completed": true, "duration_min": 25, "date": "2024-05-01"}, {}]"#,
        )
        .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].completed);
        assert!(!history[1].completed);
    }

    #[test]
    fn test_prompt_includes_summary_and_goals() {
        let request = ProfileRequest {
            workout_history: vec![record(true, 30.0), record(false, 30.0)],
            user_goals: vec!["похудеть".into()],
        };
        let text = prompt(&request).messages[0].content.clone();
        assert!(text.contains("Всего тренировок: 2"));
        assert!(text.contains("Завершено: 1 (50%)"));
        assert!(text.contains("похудеть"));
    }

    #[test]
    fn test_parse_reply() {
        let reply = r#"{"user_type": "энтузиаст", "analysis": "Тренируется часто",
            "strengths": ["дисциплина"], "optimal_training_schedule": {"frequency": "5 раз"}}"#;
        let result = parse_reply(reply).unwrap();
        assert_eq!(result.user_type, "энтузиаст");
        assert!(result.weaknesses.is_empty());
        assert_eq!(result.optimal_training_schedule.frequency, "5 раз");

        assert!(parse_reply(r#"{"analysis": "нет типа"}"#).is_err());
    }
}
