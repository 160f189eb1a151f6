#![forbid(unsafe_code)]

//! Core domain model and business logic for NeuroCoach.
//!
//! This crate provides:
//! - Domain types (exercises, measurement rules, vibe modes, coach styles)
//! - The exercise catalog, scoring and rating arithmetic
//! - Generators for vibe, workout, coach, profile and forecast payloads,
//!   each with a model path and a deterministic fallback
//! - The language-model client boundary
//! - Configuration and logging

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod scoring;
pub mod rating;
pub mod llm;
pub mod pipeline;
pub mod vibe;
pub mod workout;
pub mod coach;
pub mod profile;
pub mod forecast;
pub mod service;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use scoring::score;
pub use rating::{complete_exercise, ExerciseCompletion, UserRatingState};
pub use llm::{ChatClient, LlmError, OpenAiCompatibleClient};
pub use pipeline::{Generated, Source};
pub use service::NeuroCoach;
