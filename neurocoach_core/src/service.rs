//! The NeuroCoach facade.
//!
//! Holds the loaded configuration, the exercise catalog and an optional model
//! client. Every operation validates its request before any model call; the
//! generation operations then run through [`crate::pipeline::generate`].

use crate::catalog::get_default_catalog;
use crate::coach::{self, CoachComment, CommentRequest};
use crate::forecast::{self, ForecastRequest, ForecastResult};
use crate::llm::{ChatClient, LlmError, OpenAiCompatibleClient};
use crate::pipeline::{generate, Generated};
use crate::profile::{self, ProfileAnalysis, ProfileRequest};
use crate::rating::{self, ExerciseCompletion, UserRatingState};
use crate::vibe::{self, VibeAssessment, VibeInput, VibeRequest};
use crate::workout::{self, GeneratedWorkout, WorkoutRequest};
use crate::{Catalog, Config, Result, ScoreInput};
use std::time::Duration;

pub struct NeuroCoach<C = OpenAiCompatibleClient> {
    config: Config,
    catalog: &'static Catalog,
    client: Option<C>,
}

impl NeuroCoach<OpenAiCompatibleClient> {
    /// Build the service, connecting to the model when an API key is configured
    pub fn from_config(config: Config) -> Self {
        let client = match OpenAiCompatibleClient::from_config(&config.llm, &config.app.name) {
            Ok(client) => {
                tracing::info!("Model client ready ({})", config.llm.model);
                Some(client)
            }
            Err(LlmError::MissingApiKey) => {
                tracing::info!("No API key configured, running with fallbacks only");
                None
            }
            Err(e) => {
                tracing::warn!("Could not create model client ({}), running with fallbacks only", e);
                None
            }
        };

        Self::with_client(config, client)
    }

    /// Build the service without a model client
    pub fn offline(config: Config) -> Self {
        Self::with_client(config, None)
    }
}

impl<C: ChatClient> NeuroCoach<C> {
    pub fn with_client(config: Config, client: Option<C>) -> Self {
        Self {
            config,
            catalog: get_default_catalog(),
            client,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    fn timeout(&self) -> Duration {
        self.config.llm.timeout()
    }

    /// Classify the user's state into a vibe mode
    ///
    /// Slider input never reaches the model.
    pub async fn assess_vibe(&self, request: VibeRequest) -> Result<Generated<VibeAssessment>> {
        let text = match request.into_input()? {
            VibeInput::Sliders(sliders) => {
                let assessment = vibe::classify_sliders(sliders);
                tracing::info!("Vibe from sliders: {}", assessment.vibe_mode);
                return Ok(Generated::fallback(assessment));
            }
            VibeInput::Text(text) => text,
        };

        let result = generate(
            "vibe",
            self.client.as_ref(),
            &vibe::prompt(&text),
            self.timeout(),
            vibe::parse_reply,
            || vibe::classify_text(&text),
        )
        .await;

        tracing::info!("Vibe from text: {}", result.value.vibe_mode);
        Ok(result)
    }

    /// Build a three-phase workout plan
    pub async fn generate_workout(
        &self,
        request: WorkoutRequest,
    ) -> Result<Generated<GeneratedWorkout>> {
        request.validate()?;

        let plan = generate(
            "workout",
            self.client.as_ref(),
            &workout::prompt(&request),
            self.timeout(),
            |reply| workout::parse_reply(&request, reply),
            || workout::fallback_plan(&request.vibe_mode, request.duration_min),
        )
        .await;

        let generated = GeneratedWorkout::wrap(&request, plan);
        tracing::info!(
            "Workout {} for {} ({} min)",
            generated.value.workout_id,
            request.vibe_mode,
            request.duration_min
        );
        Ok(generated)
    }

    /// One short coach line for an exercise outcome
    pub async fn coach_comment(&self, request: CommentRequest) -> Result<Generated<CoachComment>> {
        request.validate()?;
        let style = request.coach_style();

        let comment = generate(
            "coach",
            self.client.as_ref(),
            &coach::prompt(&request, &self.config.llm.coach_model),
            self.timeout(),
            coach::parse_reply,
            || coach::fallback_comment(style, request.success).to_string(),
        )
        .await;

        Ok(comment.map(|comment| CoachComment { comment, style }))
    }

    /// Score a completed exercise against the caller's current rating
    ///
    /// On error the returned state is absent and nothing may be persisted.
    pub fn complete_exercise(
        &self,
        state: &UserRatingState,
        input: &ScoreInput,
    ) -> Result<(UserRatingState, ExerciseCompletion)> {
        rating::complete_exercise(self.catalog, state, input)
    }

    /// Classify a workout history into a behavioral profile
    pub async fn analyze_profile(
        &self,
        request: ProfileRequest,
    ) -> Result<Generated<ProfileAnalysis>> {
        let summary = profile::summarize(&request.workout_history);
        tracing::debug!(
            "Profile history: {} workouts, {} completed",
            summary.total,
            summary.completed
        );

        Ok(generate(
            "profile",
            self.client.as_ref(),
            &profile::prompt(&request),
            self.timeout(),
            profile::parse_reply,
            || profile::fallback_analysis(&request.workout_history),
        )
        .await)
    }

    /// 30-day forecast under two adherence scenarios
    pub async fn forecast(&self, request: ForecastRequest) -> Result<Generated<ForecastResult>> {
        request.validate()?;

        Ok(generate(
            "forecast",
            self.client.as_ref(),
            &forecast::prompt(&request),
            self.timeout(),
            |reply| forecast::parse_reply(&request.current_stats, reply),
            || forecast::fallback_forecast(&request.current_stats, request.consistency_level),
        )
        .await)
    }
}
