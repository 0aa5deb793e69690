//! Generate → check → repair-once → enhance → format → publish.
//!
//! The pipeline is a fixed state machine over [`PipelineStage`]. Each failure
//! class (external dependencies, missing functionality) gets at most one
//! repair call, after which the repaired text is kept whatever its score, so a
//! run makes between 3 and 5 service calls. Check failures never abort a run;
//! only service and I/O errors do.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::audit::DependencyAuditor;
use crate::config::GenerationConfig;
use crate::domain::{DependencyReport, Result, ScoreReport};
use crate::llm::{TextGenerator, TokenUsage};
use crate::obs::{
    emit_check_evaluated, emit_repair_unresolved, emit_run_finished, emit_run_started,
    emit_service_called, emit_stage_entered,
};
use crate::prompts;
use crate::sanitize::{has_code_fence, strip_code_fence};
use crate::scorer::{FunctionalityScorer, Scorer};

/// Upper bound on service calls per run.
pub const MAX_SERVICE_CALLS: u32 = 5;

/// Pipeline states, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Generating,
    DependencyCheck,
    DependencyRepair,
    FunctionalityCheck,
    FunctionalityRepair,
    VisualRepair,
    FormatRepair,
    Published,
}

impl PipelineStage {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStage::Generating => "generating",
            PipelineStage::DependencyCheck => "dependency_check",
            PipelineStage::DependencyRepair => "dependency_repair",
            PipelineStage::FunctionalityCheck => "functionality_check",
            PipelineStage::FunctionalityRepair => "functionality_repair",
            PipelineStage::VisualRepair => "visual_repair",
            PipelineStage::FormatRepair => "format_repair",
            PipelineStage::Published => "published",
        }
    }

    /// Whether entering this stage may call the generation service.
    pub fn calls_service(&self) -> bool {
        matches!(
            self,
            PipelineStage::Generating
                | PipelineStage::DependencyRepair
                | PipelineStage::FunctionalityRepair
                | PipelineStage::VisualRepair
                | PipelineStage::FormatRepair
        )
    }
}

/// Which optional stages actually ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagesExecuted {
    pub dependency_repair: bool,
    pub functionality_repair: bool,
    pub visual_enhancement: bool,
    pub formatting: bool,
}

/// Result of one check, tagged by check kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum CheckResult {
    Functionality(ScoreReport),
    Dependencies(DependencyReport),
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        match self {
            CheckResult::Functionality(r) => r.passing,
            CheckResult::Dependencies(r) => !r.has_external_deps,
        }
    }
}

/// A check and the stage that ran it, kept so intermediate failures stay
/// visible after later stages replace the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRecord {
    pub stage: PipelineStage,
    #[serde(flatten)]
    pub result: CheckResult,
}

/// Transient state threaded through one run.
#[derive(Debug)]
struct PipelineRun {
    run_id: String,
    current_source: String,
    latest_score: Option<ScoreReport>,
    latest_dependencies: Option<DependencyReport>,
    usage: BTreeMap<String, TokenUsage>,
    service_calls: u32,
    stages: StagesExecuted,
    history: Vec<CheckRecord>,
    trace: Vec<PipelineStage>,
}

impl PipelineRun {
    fn new(run_id: String) -> Self {
        Self {
            run_id,
            current_source: String::new(),
            latest_score: None,
            latest_dependencies: None,
            usage: BTreeMap::new(),
            service_calls: 0,
            stages: StagesExecuted::default(),
            history: Vec::new(),
            trace: Vec::new(),
        }
    }

    fn record_score(&mut self, stage: PipelineStage, report: ScoreReport) {
        emit_check_evaluated(&self.run_id, &report.scorer, report.percentage, report.passing);
        self.history.push(CheckRecord {
            stage,
            result: CheckResult::Functionality(report.clone()),
        });
        self.latest_score = Some(report);
    }

    fn record_dependencies(&mut self, stage: PipelineStage, report: DependencyReport) {
        let clean = !report.has_external_deps;
        emit_check_evaluated(&self.run_id, "dependencies", if clean { 100.0 } else { 0.0 }, clean);
        self.history.push(CheckRecord {
            stage,
            result: CheckResult::Dependencies(report.clone()),
        });
        self.latest_dependencies = Some(report);
    }
}

/// Everything the publisher needs from a finished run.
///
/// `functionality` and `dependencies` were computed on `source` itself, after
/// the last service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub run_id: String,
    pub model: String,
    pub theme: String,
    /// The initial generation prompt.
    pub prompt: String,
    pub source: String,
    pub functionality: ScoreReport,
    pub dependencies: DependencyReport,
    pub history: Vec<CheckRecord>,
    pub token_usage: BTreeMap<String, TokenUsage>,
    pub service_calls: u32,
    pub stages: StagesExecuted,
    pub trace: Vec<PipelineStage>,
    pub duration_ms: u64,
}

impl PipelineOutcome {
    pub fn total_usage(&self) -> TokenUsage {
        self.token_usage
            .values()
            .fold(TokenUsage::default(), |acc, u| acc + *u)
    }

    pub fn passing(&self) -> bool {
        self.functionality.passing
    }

    /// First functionality report of the run, before any repair.
    pub fn initial_functionality(&self) -> Option<&ScoreReport> {
        self.history.iter().find_map(|r| match &r.result {
            CheckResult::Functionality(report) => Some(report),
            CheckResult::Dependencies(_) => None,
        })
    }

    /// First dependency report of the run, before any repair.
    pub fn initial_dependencies(&self) -> Option<&DependencyReport> {
        self.history.iter().find_map(|r| match &r.result {
            CheckResult::Dependencies(report) => Some(report),
            CheckResult::Functionality(_) => None,
        })
    }
}

/// Orchestrates one generation run against a [`TextGenerator`].
pub struct GenerationPipeline {
    config: GenerationConfig,
    generator: Arc<dyn TextGenerator>,
    scorer: Box<dyn Scorer>,
    auditor: DependencyAuditor,
}

impl GenerationPipeline {
    /// Build a pipeline with the functionality scorer at the configured threshold.
    pub fn new(config: GenerationConfig, generator: Arc<dyn TextGenerator>) -> Self {
        let scorer = Box::new(FunctionalityScorer::new(config.pass_threshold));
        Self {
            config,
            generator,
            scorer,
            auditor: DependencyAuditor::default(),
        }
    }

    /// Swap the scoring strategy.
    pub fn with_scorer(mut self, scorer: Box<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_auditor(mut self, auditor: DependencyAuditor) -> Self {
        self.auditor = auditor;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Execute one run. Service failures abort with an error; check failures
    /// are carried in the outcome.
    pub async fn run(&self) -> Result<PipelineOutcome> {
        self.config.validate()?;
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("gameday.run", run_id = %run_id);
        self.execute(run_id).instrument(span).await
    }

    async fn execute(&self, run_id: String) -> Result<PipelineOutcome> {
        let start = Instant::now();
        emit_run_started(&run_id, &self.config.model, &self.config.theme);

        let prompt = prompts::generation_prompt(&self.config.theme);
        let mut run = PipelineRun::new(run_id);
        let mut stage = PipelineStage::Generating;

        let (functionality, dependencies) = loop {
            emit_stage_entered(&run.run_id, stage.name());
            run.trace.push(stage);

            stage = match stage {
                PipelineStage::Generating => {
                    run.current_source = self.call(&mut run, stage, &prompt).await?;
                    PipelineStage::DependencyCheck
                }

                PipelineStage::DependencyCheck => {
                    let report = self.auditor.audit(&run.current_source);
                    let external = report.has_external_deps;
                    run.record_dependencies(stage, report);
                    if external {
                        PipelineStage::DependencyRepair
                    } else {
                        PipelineStage::FunctionalityCheck
                    }
                }

                PipelineStage::DependencyRepair => {
                    let before = run.latest_dependencies.clone().unwrap_or_default();
                    let repair_prompt =
                        prompts::dependency_repair_prompt(&run.current_source, &before);
                    run.current_source = self.call(&mut run, stage, &repair_prompt).await?;
                    run.stages.dependency_repair = true;

                    let after = self.auditor.audit(&run.current_source);
                    if after.has_external_deps {
                        emit_repair_unresolved(&run.run_id, "dependencies", &after.issues);
                    }
                    run.record_dependencies(stage, after);
                    PipelineStage::FunctionalityCheck
                }

                PipelineStage::FunctionalityCheck => {
                    let report = self.scorer.score(&run.current_source);
                    let passing = report.passing;
                    run.record_score(stage, report);
                    if passing {
                        PipelineStage::VisualRepair
                    } else {
                        PipelineStage::FunctionalityRepair
                    }
                }

                PipelineStage::FunctionalityRepair => {
                    let before = match &run.latest_score {
                        Some(report) => report.clone(),
                        None => self.scorer.score(&run.current_source),
                    };
                    let repair_prompt =
                        prompts::functionality_repair_prompt(&run.current_source, &before);
                    run.current_source = self.call(&mut run, stage, &repair_prompt).await?;
                    run.stages.functionality_repair = true;

                    let after = self.scorer.score(&run.current_source);
                    if !after.passing {
                        emit_repair_unresolved(&run.run_id, self.scorer.name(), &after.issues);
                    }
                    run.record_score(stage, after);
                    PipelineStage::VisualRepair
                }

                PipelineStage::VisualRepair => {
                    if self.config.visual_enhancement {
                        let enhance_prompt =
                            prompts::visual_enhancement_prompt(&run.current_source);
                        run.current_source = self.call(&mut run, stage, &enhance_prompt).await?;
                        run.stages.visual_enhancement = true;
                    } else {
                        debug!(stage = stage.name(), "stage disabled");
                    }
                    PipelineStage::FormatRepair
                }

                PipelineStage::FormatRepair => {
                    if self.config.formatting {
                        let format_prompt = prompts::formatting_prompt(&run.current_source);
                        run.current_source = self.call(&mut run, stage, &format_prompt).await?;
                        run.stages.formatting = true;
                    } else {
                        debug!(stage = stage.name(), "stage disabled");
                    }
                    PipelineStage::Published
                }

                PipelineStage::Published => {
                    // Authoritative checks on the exact text being published.
                    let functionality = self.scorer.score(&run.current_source);
                    let dependencies = self.auditor.audit(&run.current_source);
                    run.record_score(stage, functionality.clone());
                    run.record_dependencies(stage, dependencies.clone());
                    break (functionality, dependencies);
                }
            };
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        emit_run_finished(
            &run.run_id,
            duration_ms,
            run.service_calls,
            functionality.passing,
        );

        Ok(PipelineOutcome {
            run_id: run.run_id,
            model: self.config.model.clone(),
            theme: self.config.theme.clone(),
            prompt,
            source: run.current_source,
            functionality,
            dependencies,
            history: run.history,
            token_usage: run.usage,
            service_calls: run.service_calls,
            stages: run.stages,
            trace: run.trace,
            duration_ms,
        })
    }

    /// One service call: submit, account usage, strip fencing.
    async fn call(
        &self,
        run: &mut PipelineRun,
        stage: PipelineStage,
        prompt: &str,
    ) -> Result<String> {
        debug_assert!(
            stage.calls_service(),
            "stage {} does not call the generation service",
            stage.name()
        );
        debug_assert!(
            run.service_calls < MAX_SERVICE_CALLS,
            "service call budget of {} exhausted",
            MAX_SERVICE_CALLS
        );
        let generation = self.generator.generate(&self.config.model, prompt).await?;
        run.service_calls += 1;
        *run.usage.entry(stage.name().to_string()).or_default() += generation.usage;
        emit_service_called(
            &run.run_id,
            stage.name(),
            generation.text.len(),
            &generation.usage,
        );

        if has_code_fence(&generation.text) {
            debug!(stage = stage.name(), "stripping markdown fence from model output");
        }
        Ok(strip_code_fence(&generation.text))
    }
}
