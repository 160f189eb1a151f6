//! Short motivational coach lines.

use crate::llm::{ChatOptions, LlmError};
use crate::pipeline::Prompt;
use crate::{CoachStyle, Error, Result};
use serde::{Deserialize, Serialize};

/// Incoming comment request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentRequest {
    /// Unrecognized styles are treated as balanced
    pub style: String,
    pub exercise: String,
    pub success: bool,
    #[serde(default)]
    pub user_progress: f64,
    #[serde(default)]
    pub additional_context: String,
}

impl CommentRequest {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.user_progress) {
            return Err(Error::Validation(format!(
                "user_progress must be between 0 and 1 (got {})",
                self.user_progress
            )));
        }
        Ok(())
    }

    pub fn coach_style(&self) -> CoachStyle {
        CoachStyle::parse_lenient(&self.style)
    }
}

/// A coach line and the style it was written in
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CoachComment {
    pub comment: String,
    pub style: CoachStyle,
}

/// Canned line for a style and outcome
pub fn fallback_comment(style: CoachStyle, success: bool) -> &'static str {
    match (style, success) {
        (CoachStyle::Strict, true) => "Так держать!",
        (CoachStyle::Strict, false) => "Повторить!",
        (CoachStyle::Soft, true) => "Молодец, продолжай!",
        (CoachStyle::Soft, false) => "Ничего, попробуй еще раз!",
        (CoachStyle::Comedy, true) => "Отлично! Почти как профи!",
        (CoachStyle::Comedy, false) => "Эх, почти получилось!",
        (CoachStyle::Anime, true) => "Субарасии! (Потрясающе!)",
        (CoachStyle::Anime, false) => "Гамбаттэ! (Не сдавайся!)",
        (CoachStyle::Balanced, true) => "Хорошо выполнено.",
        (CoachStyle::Balanced, false) => "Нужно поработать над техникой.",
    }
}

fn persona(style: CoachStyle) -> &'static str {
    match style {
        CoachStyle::Strict => "Ты строгий армейский инструктор. Говори кратко, жёстко, по делу.",
        CoachStyle::Soft => "Ты заботливый поддерживающий друг. Подбадриваешь мягко и тепло.",
        CoachStyle::Comedy => "Ты юмористический комментатор. Шутишь, но при этом мотивируешь.",
        CoachStyle::Anime => "Ты аниме-сенсей. Говоришь драматично, с японскими терминами.",
        CoachStyle::Balanced => {
            "Ты профессиональный тренер. Даёшь сбалансированные комментарии."
        }
    }
}

/// Model prompt for a comment
pub fn prompt(request: &CommentRequest, model: &str) -> Prompt {
    let outcome = if request.success {
        "Успешно выполнено"
    } else {
        "Нужно улучшить"
    };

    let content = format!(
        "{}\n\nУпражнение: {}\nРезультат: {}\nПрогресс пользователя: {:.0}%\nКонтекст: {}\n\n\
         Сгенерируй одну короткую реплику тренера (до 10 слов) для этого момента.\n\
         Только реплику, без пояснений.",
        persona(request.coach_style()),
        request.exercise,
        outcome,
        request.user_progress * 100.0,
        request.additional_context,
    );

    Prompt::user(
        content,
        ChatOptions {
            model: Some(model.to_string()),
            temperature: Some(0.7),
            max_tokens: Some(50),
        },
    )
}

/// Clean up a model reply; an empty reply is a failure
pub fn parse_reply(reply: &str) -> std::result::Result<String, LlmError> {
    let comment = reply
        .trim()
        .trim_matches(|c| c == '"' || c == '«' || c == '»')
        .trim();

    if comment.is_empty() {
        return Err(LlmError::Parse("empty coach comment".into()));
    }
    Ok(comment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(style: &str, success: bool) -> CommentRequest {
        CommentRequest {
            style: style.into(),
            exercise: "squat".into(),
            success,
            user_progress: 0.5,
            additional_context: String::new(),
        }
    }

    #[test]
    fn test_fallback_table() {
        assert_eq!(fallback_comment(CoachStyle::Strict, true), "Так держать!");
        assert_eq!(fallback_comment(CoachStyle::Strict, false), "Повторить!");
        assert_eq!(
            fallback_comment(CoachStyle::Anime, false),
            "Гамбаттэ! (Не сдавайся!)"
        );
    }

    #[test]
    fn test_unknown_style_uses_balanced_lines() {
        let req = request("drill_sergeant", false);
        assert_eq!(req.coach_style(), CoachStyle::Balanced);
        assert_eq!(
            fallback_comment(req.coach_style(), req.success),
            "Нужно поработать над техникой."
        );
    }

    #[test]
    fn test_progress_validation() {
        assert!(request("soft", true).validate().is_ok());

        let mut req = request("soft", true);
        req.user_progress = 1.5;
        assert!(matches!(req.validate(), Err(Error::Validation(_))));

        req.user_progress = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_prompt_contents() {
        let prompt = prompt(&request("comedy", true), "openai/gpt-3.5-turbo");
        let text = &prompt.messages[0].content;
        assert!(text.contains("юмористический"));
        assert!(text.contains("squat"));
        assert!(text.contains("50%"));
        assert_eq!(prompt.options.max_tokens, Some(50));
        assert_eq!(prompt.options.model.as_deref(), Some("openai/gpt-3.5-turbo"));
    }

    #[test]
    fn test_parse_reply_trims_quotes() {
        assert_eq!(parse_reply("  \"Вперёд!\" \n").unwrap(), "Вперёд!");
        assert_eq!(parse_reply("«Дожми!»").unwrap(), "Дожми!");
        assert!(parse_reply("  \"\" ").is_err());
    }
}
