//! Gameday Core Library
//!
//! Produces one self-contained browser game per day: prompt a text-generation
//! service, gate the result with heuristic checks, repair once per failure,
//! polish, then publish the game with its metadata.

pub mod audit;
pub mod batch;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod llm;
pub mod obs;
pub mod pipeline;
pub mod prompts;
pub mod publisher;
pub mod sanitize;
pub mod scorer;
pub mod telemetry;

pub use audit::{default_rules, DependencyAuditor, DependencyRule, ResourceKind};
pub use batch::{evaluate_games, BatchSummary, GameOutcome, GameResult};
pub use config::{GenerationConfig, OpenAiConfig};
pub use domain::{DependencyReport, GamedayError, Result, ScoreReport};
pub use llm::{Generation, OpenAiClient, TextGenerator, TokenUsage};
pub use pipeline::{
    CheckRecord, CheckResult, GenerationPipeline, PipelineOutcome, PipelineStage, StagesExecuted,
    MAX_SERVICE_CALLS,
};
pub use publisher::{ArtifactPublisher, GameArtifact, GameMetadata, PublishedPaths};
pub use scorer::{AccessibilityScorer, FunctionalityScorer, Scorer};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
