//! Conversion of a completed exercise into rating points.
//!
//! Repetition-based exercises earn `reps * points_per_rep`. Time-based
//! exercises earn points only for whole buckets: 29 seconds against a
//! 10-second bucket counts as 2 buckets. All arithmetic is integer and checked.

use crate::{Catalog, Error, ExerciseConfig, MeasurementRule, Result, ScoreInput, ScoreResult};

/// Score an exercise against the catalog
///
/// Fails with:
/// - `UnknownExercise` if the id is not in the catalog
/// - `MissingMeasurement` if the field required by the exercise rule is absent
/// - `InvalidMeasurement` if that field is negative or the product overflows
///
/// The field not used by the rule is ignored.
pub fn score(
    catalog: &Catalog,
    exercise_id: &str,
    reps: Option<i64>,
    seconds: Option<i64>,
) -> Result<ScoreResult> {
    let exercise = catalog.lookup(exercise_id)?;
    score_exercise(exercise, reps, seconds)
}

/// Score a request payload against the catalog
pub fn score_input(catalog: &Catalog, input: &ScoreInput) -> Result<ScoreResult> {
    score(catalog, &input.exercise_slug, input.reps, input.seconds)
}

/// Score against a single catalog entry
pub fn score_exercise(
    exercise: &ExerciseConfig,
    reps: Option<i64>,
    seconds: Option<i64>,
) -> Result<ScoreResult> {
    let (units, per_unit) = match exercise.rule {
        MeasurementRule::RepBased { points_per_rep } => {
            if seconds.is_some() {
                tracing::debug!("Ignoring 'seconds' for rep-based exercise {}", exercise.id);
            }
            let reps = require(exercise, "reps", reps)?;
            (reps, points_per_rep)
        }
        MeasurementRule::TimeBased {
            bucket_seconds,
            points_per_bucket,
        } => {
            if reps.is_some() {
                tracing::debug!("Ignoring 'reps' for time-based exercise {}", exercise.id);
            }
            let seconds = require(exercise, "seconds", seconds)?;
            if bucket_seconds == 0 {
                return Err(Error::Internal(format!(
                    "Exercise '{}' has a zero bucket size",
                    exercise.id
                )));
            }
            (seconds / u64::from(bucket_seconds), points_per_bucket)
        }
    };

    let points = units
        .checked_mul(u64::from(per_unit))
        .ok_or_else(|| Error::InvalidMeasurement {
            exercise: exercise.id.clone(),
            reason: "point total overflows".into(),
        })?;

    tracing::debug!(
        "Scored {}: {} units x {} = {} points",
        exercise.id,
        units,
        per_unit,
        points
    );

    Ok(ScoreResult {
        exercise_id: exercise.id.clone(),
        category: exercise.category,
        units,
        points,
    })
}

fn require(exercise: &ExerciseConfig, field: &'static str, value: Option<i64>) -> Result<u64> {
    let value = value.ok_or_else(|| Error::MissingMeasurement {
        exercise: exercise.id.clone(),
        field,
    })?;

    u64::try_from(value).map_err(|_| Error::InvalidMeasurement {
        exercise: exercise.id.clone(),
        reason: format!("'{}' must not be negative (got {})", field, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_default_catalog, ExerciseCategory};

    #[test]
    fn test_squat_reps() {
        let catalog = build_default_catalog();
        let result = score(&catalog, "squat", Some(15), None).unwrap();
        assert_eq!(result.points, 30);
        assert_eq!(result.units, 15);
        assert_eq!(result.category, ExerciseCategory::Strength);
    }

    #[test]
    fn test_plank_partial_bucket_is_truncated() {
        let catalog = build_default_catalog();
        assert_eq!(score(&catalog, "plank", None, Some(29)).unwrap().points, 8);
        assert_eq!(score(&catalog, "plank", None, Some(30)).unwrap().points, 12);
        assert_eq!(score(&catalog, "plank", None, Some(9)).unwrap().points, 0);
    }

    #[test]
    fn test_all_rep_exercises_are_linear() {
        let catalog = build_default_catalog();
        for exercise in catalog.exercises.values() {
            if let MeasurementRule::RepBased { points_per_rep } = exercise.rule {
                for r in [0_i64, 1, 7, 15, 100] {
                    let result = score_exercise(exercise, Some(r), None).unwrap();
                    assert_eq!(result.points, r as u64 * u64::from(points_per_rep));
                }
            }
        }
    }

    #[test]
    fn test_all_time_exercises_count_whole_buckets() {
        let catalog = build_default_catalog();
        for exercise in catalog.exercises.values() {
            if let MeasurementRule::TimeBased {
                bucket_seconds,
                points_per_bucket,
            } = exercise.rule
            {
                let b = i64::from(bucket_seconds);
                let per = u64::from(points_per_bucket);

                let just_short = score_exercise(exercise, None, Some(b - 1)).unwrap();
                assert_eq!(just_short.points, 0, "{}", exercise.id);

                let exact = score_exercise(exercise, None, Some(b)).unwrap();
                assert_eq!(exact.points, per, "{}", exercise.id);

                let three_and_change = score_exercise(exercise, None, Some(3 * b + b - 1)).unwrap();
                assert_eq!(three_and_change.units, 3);
                assert_eq!(three_and_change.points, 3 * per, "{}", exercise.id);
            }
        }
    }

    #[test]
    fn test_unknown_exercise() {
        let catalog = build_default_catalog();
        let err = score(&catalog, "unknown_exercise_xyz", Some(5), None).unwrap_err();
        assert!(matches!(err, Error::UnknownExercise(_)));
    }

    #[test]
    fn test_missing_measurement() {
        let catalog = build_default_catalog();
        let err = score(&catalog, "squat", None, None).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMeasurement { field: "reps", .. }
        ));

        // Supplying the wrong field does not satisfy the rule
        let err = score(&catalog, "plank", Some(10), None).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMeasurement {
                field: "seconds",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_measurement_rejected() {
        let catalog = build_default_catalog();
        let err = score(&catalog, "squat", Some(-1), None).unwrap_err();
        assert!(matches!(err, Error::InvalidMeasurement { .. }));

        let err = score(&catalog, "plank", None, Some(-30)).unwrap_err();
        assert!(matches!(err, Error::InvalidMeasurement { .. }));
    }

    #[test]
    fn test_unused_field_is_ignored() {
        let catalog = build_default_catalog();
        let result = score(&catalog, "squat", Some(10), Some(-5)).unwrap();
        assert_eq!(result.points, 20);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let catalog = build_default_catalog();
        let err = score(&catalog, "pushup", Some(i64::MAX), None).unwrap_err();
        assert!(matches!(err, Error::InvalidMeasurement { .. }));
    }

    #[test]
    fn test_score_input() {
        let catalog = build_default_catalog();
        let result = score_input(&catalog, &ScoreInput::seconds("stretch", 95)).unwrap();
        assert_eq!(result.units, 3);
        assert_eq!(result.points, 3);
    }
}
