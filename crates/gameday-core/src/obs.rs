//! Structured observability hooks for generation runs.
//!
//! This module provides:
//! - Run-scoped tracing spans via the `RunSpan` RAII guard
//! - Emission functions for lifecycle events: run start, stage transitions,
//!   service calls, check results, unresolved repairs, run finish, publish
//!
//! Events are emitted at `info!` level except for unresolved repairs, which
//! are warnings. Filter with `RUST_LOG`; see [`crate::telemetry::init_tracing`].

use tracing::{info, warn};

use crate::llm::TokenUsage;

/// RAII guard that enters a run-scoped tracing span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("3f1c...");
/// // Every tracing call below is associated with run_id = "3f1c..."
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run_id.
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("gameday.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: run started for a model and theme.
pub fn emit_run_started(run_id: &str, model: &str, theme: &str) {
    info!(event = "run.started", run_id = %run_id, model = %model, theme = %theme);
}

/// Emit event: pipeline entered a stage.
pub fn emit_stage_entered(run_id: &str, stage: &str) {
    info!(event = "stage.entered", run_id = %run_id, stage = %stage);
}

/// Emit event: one generation service call completed.
pub fn emit_service_called(run_id: &str, stage: &str, output_bytes: usize, usage: &TokenUsage) {
    info!(
        event = "service.called",
        run_id = %run_id,
        stage = %stage,
        output_bytes = output_bytes,
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        total_tokens = usage.total_tokens,
    );
}

/// Emit event: a heuristic check was evaluated.
pub fn emit_check_evaluated(run_id: &str, check: &str, percentage: f64, passed: bool) {
    info!(
        event = "check.evaluated",
        run_id = %run_id,
        check = %check,
        percentage = percentage,
        passed = passed,
    );
}

/// Emit event: a repair attempt did not resolve its failure (warning level).
pub fn emit_repair_unresolved(run_id: &str, check: &str, remaining: &[String]) {
    warn!(
        event = "repair.unresolved",
        run_id = %run_id,
        check = %check,
        remaining = %remaining.join("; "),
    );
}

/// Emit event: run finished.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, service_calls: u32, passing: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        service_calls = service_calls,
        passing = passing,
    );
}

/// Emit event: an artifact was written to disk.
pub fn emit_artifact_published(date: &str, path: &std::path::Path, output_bytes: usize) {
    info!(
        event = "artifact.published",
        date = %date,
        path = %path.display(),
        output_bytes = output_bytes,
    );
}
