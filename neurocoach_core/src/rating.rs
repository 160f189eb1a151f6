//! Cumulative user rating.
//!
//! The store that holds ratings belongs to the caller, which must serialize
//! read-modify-write per user. This module only validates, scores and adds.

use crate::scoring::score_input;
use crate::{Catalog, Error, Result, ScoreInput, ScoreResult};
use serde::{Deserialize, Serialize};

/// Rating ladder, lowest first
const LEVELS: [(u64, &str); 5] = [
    (0, "Новичок"),
    (100, "Любитель"),
    (500, "Атлет"),
    (1500, "Профи"),
    (5000, "Легенда"),
];

/// A user's cumulative rating
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRatingState {
    pub rating: u64,
}

impl UserRatingState {
    pub fn new(rating: u64) -> Self {
        Self { rating }
    }

    /// Textual level derived from the rating
    pub fn level(&self) -> &'static str {
        rating_level(self.rating)
    }
}

/// Outcome of a successful completed-exercise call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseCompletion {
    pub status: String,
    pub points_earned: u64,
    pub total_rating: u64,
    pub rating_level: String,
    #[serde(skip)]
    pub score: Option<ScoreResult>,
}

/// Level label for a rating value
pub fn rating_level(rating: u64) -> &'static str {
    LEVELS
        .iter()
        .rev()
        .find(|(threshold, _)| rating >= *threshold)
        .map(|(_, label)| *label)
        .unwrap_or(LEVELS[0].1)
}

/// Add points to a rating
pub fn apply(current_rating: u64, points: u64) -> Result<u64> {
    current_rating
        .checked_add(points)
        .ok_or_else(|| Error::Internal("rating overflow".into()))
}

/// Score a completed exercise and compute the resulting rating
///
/// Scoring is validated before anything else; on error no new state is
/// produced and the caller must not persist anything.
pub fn complete_exercise(
    catalog: &Catalog,
    state: &UserRatingState,
    input: &ScoreInput,
) -> Result<(UserRatingState, ExerciseCompletion)> {
    let score = score_input(catalog, input)?;
    let total = apply(state.rating, score.points)?;
    let new_state = UserRatingState::new(total);

    tracing::info!(
        "Exercise {} earned {} points, rating {} -> {}",
        score.exercise_id,
        score.points,
        state.rating,
        total
    );

    let completion = ExerciseCompletion {
        status: "success".into(),
        points_earned: score.points,
        total_rating: total,
        rating_level: new_state.level().to_string(),
        score: Some(score),
    };

    Ok((new_state, completion))
}
