use clap::{Parser, Subcommand};
use neurocoach_core::coach::CommentRequest;
use neurocoach_core::forecast::ForecastRequest;
use neurocoach_core::profile::ProfileRequest;
use neurocoach_core::vibe::VibeRequest;
use neurocoach_core::workout::WorkoutRequest;
use neurocoach_core::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "neurocoach")]
#[command(about = "Mood-aware workout generation and coaching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never call the language model; always use the built-in fallbacks
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the current mood into a vibe mode
    Vibe {
        /// Free-text description of how you feel
        #[arg(long)]
        text: Option<String>,

        /// Fatigue level (1-5)
        #[arg(long)]
        fatigue: Option<i64>,

        /// Stress level (1-5)
        #[arg(long)]
        stress: Option<i64>,

        /// Motivation level (1-5)
        #[arg(long)]
        motivation: Option<i64>,

        /// Read the request from a JSON file
        #[arg(long, conflicts_with_all = ["text", "fatigue", "stress", "motivation"])]
        request: Option<PathBuf>,
    },

    /// Generate a three-phase workout
    Workout {
        /// Vibe mode (anti_stress, rage, boost, neutral)
        #[arg(long, required_unless_present = "request")]
        mode: Option<String>,

        /// Duration in minutes (10-90)
        #[arg(long, default_value_t = 30)]
        duration: u32,

        /// Fitness level (beginner, intermediate, advanced)
        #[arg(long, default_value = "intermediate")]
        fitness_level: String,

        /// Available equipment (repeatable)
        #[arg(long = "equipment")]
        equipment: Vec<String>,

        /// Read the request from a JSON file
        #[arg(long, conflicts_with = "mode")]
        request: Option<PathBuf>,
    },

    /// Get a short coach comment for an exercise
    Coach {
        /// Coach style (strict, soft, comedy, anime, balanced)
        #[arg(long, default_value = "balanced")]
        style: String,

        /// Exercise that was performed
        #[arg(long, required_unless_present = "request")]
        exercise: Option<String>,

        /// The attempt was not successful
        #[arg(long)]
        failed: bool,

        /// Overall progress (0-1)
        #[arg(long, default_value_t = 0.0)]
        progress: f64,

        /// Extra context for the coach
        #[arg(long, default_value = "")]
        context: String,

        /// Read the request from a JSON file
        #[arg(long, conflicts_with = "exercise")]
        request: Option<PathBuf>,
    },

    /// Score a completed exercise and update the rating
    Complete {
        /// Exercise id from the catalog
        #[arg(long, required_unless_present = "request")]
        exercise: Option<String>,

        /// Repetitions performed
        #[arg(long)]
        reps: Option<i64>,

        /// Seconds held
        #[arg(long)]
        seconds: Option<i64>,

        /// Current rating before this exercise
        #[arg(long, default_value_t = 0)]
        rating: u64,

        /// Read the exercise payload from a JSON file
        #[arg(long, conflicts_with_all = ["exercise", "reps", "seconds"])]
        request: Option<PathBuf>,
    },

    /// Analyze workout history into a profile
    Profile {
        /// Read the request from a JSON file
        #[arg(long)]
        request: Option<PathBuf>,
    },

    /// Forecast the next 30 days
    Forecast {
        /// Expected consistency (0-1)
        #[arg(long)]
        consistency: Option<f64>,

        /// Read the request from a JSON file
        #[arg(long)]
        request: Option<PathBuf>,
    },

    /// List the exercise catalog
    Exercises,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    neurocoach_core::logging::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let service = if cli.offline {
        NeuroCoach::offline(config)
    } else {
        NeuroCoach::from_config(config)
    };

    match cli.command {
        Commands::Vibe {
            text,
            fatigue,
            stress,
            motivation,
            request,
        } => {
            let request = match request {
                Some(path) => read_request(&path)?,
                None => VibeRequest {
                    user_input: text,
                    fatigue_level: fatigue,
                    stress_level: stress,
                    motivation_level: motivation,
                },
            };
            print_json(&service.assess_vibe(request).await?)
        }

        Commands::Workout {
            mode,
            duration,
            fitness_level,
            equipment,
            request,
        } => {
            let request = match (request, mode) {
                (Some(path), _) => read_request(&path)?,
                (None, Some(mode)) => {
                    let mut request = WorkoutRequest::new(mode, duration);
                    request.fitness_level = fitness_level;
                    if !equipment.is_empty() {
                        request.equipment = equipment;
                    }
                    request
                }
                (None, None) => return Err(Error::Validation("--mode is required".into())),
            };
            print_json(&service.generate_workout(request).await?)
        }

        Commands::Coach {
            style,
            exercise,
            failed,
            progress,
            context,
            request,
        } => {
            let request = match (request, exercise) {
                (Some(path), _) => read_request(&path)?,
                (None, Some(exercise)) => CommentRequest {
                    style,
                    exercise,
                    success: !failed,
                    user_progress: progress,
                    additional_context: context,
                },
                (None, None) => {
                    return Err(Error::Validation("--exercise is required".into()))
                }
            };
            print_json(&service.coach_comment(request).await?)
        }

        Commands::Complete {
            exercise,
            reps,
            seconds,
            rating,
            request,
        } => {
            let input = match (request, exercise) {
                (Some(path), _) => read_request(&path)?,
                (None, Some(exercise_slug)) => ScoreInput {
                    exercise_slug,
                    reps,
                    seconds,
                },
                (None, None) => {
                    return Err(Error::Validation("--exercise is required".into()))
                }
            };
            let (_, completion) =
                service.complete_exercise(&UserRatingState::new(rating), &input)?;
            print_json(&completion)
        }

        Commands::Profile { request } => {
            let request = match request {
                Some(path) => read_request(&path)?,
                None => ProfileRequest::default(),
            };
            print_json(&service.analyze_profile(request).await?)
        }

        Commands::Forecast {
            consistency,
            request,
        } => {
            let mut request: ForecastRequest = match request {
                Some(path) => read_request(&path)?,
                None => ForecastRequest::default(),
            };
            if let Some(consistency) = consistency {
                request.consistency_level = consistency;
            }
            print_json(&service.forecast(request).await?)
        }

        Commands::Exercises => cmd_exercises(service.catalog()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
        None => Config::load(),
    }
}

/// Malformed request files are the caller's fault, not an internal failure
fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Validation(format!("cannot read request file {:?}: {}", path, e))
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| Error::Validation(format!("invalid request file {:?}: {}", path, e)))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_exercises(catalog: &Catalog) -> Result<()> {
    let errors = catalog.validate();
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("Catalog: {}", error);
        }
        return Err(Error::CatalogValidation(errors.join("; ")));
    }

    print_json(&catalog.sorted())
}
