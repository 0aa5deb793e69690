//! End-to-end pipeline runs against a scripted generation service.

use std::sync::Arc;

use gameday_core::fakes::ScriptedGenerator;
use gameday_core::{
    CheckResult, FunctionalityScorer, GamedayError, GenerationConfig, GenerationPipeline,
    PipelineStage, Scorer, TextGenerator, MAX_SERVICE_CALLS,
};

const GOOD: &str = r#"const canvas = document.getElementById('game-of-the-day-stage');
const ctx = canvas.getContext('2d');
let score = 0;
document.addEventListener('keydown', (e) => { score += 1; });
function loop() {
  try {
    ctx.clearRect(0, 0, 720, 480);
    ctx.fillRect(10, 10, 20, 20);
    ctx.fillText('Score: ' + score, 10, 40);
  } catch (err) {
    console.error(err);
  }
  requestAnimationFrame(loop);
}
loop();"#;

const FORMATTED: &str = r#"const canvas = document.getElementById('game-of-the-day-stage');
const ctx = canvas.getContext('2d');

let score = 0;
let lives = 3;

document.addEventListener('keydown', (e) => {
  score += 1;
});

function loop() {
  try {
    ctx.clearRect(0, 0, 720, 480);
    ctx.fillRect(10, 10, 20, 20);
    ctx.fillText('Score: ' + score, 10, 40);
  } catch (err) {
    console.error(err);
  }
  requestAnimationFrame(loop);
}

loop();"#;

/// Loses error handling and state keywords: scores 6/8, still passing.
const REFORMATTED_WEAKER: &str = r#"const canvas = document.getElementById('game-of-the-day-stage');
const ctx = canvas.getContext('2d');
let taps = 0;
document.addEventListener('keydown', (e) => { taps += 1; });
function loop() {
  ctx.clearRect(0, 0, 720, 480);
  ctx.fillRect(10, 10, 20, 20);
  ctx.fillText('Taps: ' + taps, 10, 40);
  requestAnimationFrame(loop);
}
loop();"#;

/// Fails every functionality category.
const BARE: &str = "let x = 1;";

/// Fails functionality and references a hosted image.
const EXTERNAL: &str = "const hero = 'https://example.com/hero.png';";

fn pipeline(generator: Arc<ScriptedGenerator>) -> GenerationPipeline {
    let generator: Arc<dyn TextGenerator> = generator;
    GenerationPipeline::new(GenerationConfig::default(), generator)
}

#[tokio::test]
async fn clean_first_draft_makes_three_calls() {
    let fake = Arc::new(
        ScriptedGenerator::new()
            .with_response(GOOD)
            .with_response(GOOD)
            .with_response(FORMATTED),
    );
    let outcome = pipeline(fake.clone()).run().await.unwrap();

    assert_eq!(fake.call_count(), 3);
    assert_eq!(outcome.service_calls, 3);
    assert_eq!(outcome.source, FORMATTED);
    assert!(outcome.passing());
    assert!(!outcome.dependencies.has_external_deps);
    assert!(!outcome.stages.dependency_repair);
    assert!(!outcome.stages.functionality_repair);
    assert!(outcome.stages.visual_enhancement);
    assert!(outcome.stages.formatting);
    assert_eq!(
        outcome.trace,
        vec![
            PipelineStage::Generating,
            PipelineStage::DependencyCheck,
            PipelineStage::FunctionalityCheck,
            PipelineStage::VisualRepair,
            PipelineStage::FormatRepair,
            PipelineStage::Published,
        ]
    );

    let calls = fake.calls();
    assert!(calls.iter().all(|c| c.model == "gpt-4.1-mini"));
    assert!(calls[0].prompt.contains("open world exploration"));
    assert!(calls[1].prompt.contains("Do NOT change game logic"));
    assert!(calls[2].prompt.contains("Do not change any behavior"));
    assert!(calls[2].prompt.ends_with(&format!("{}\n", GOOD)));

    assert_eq!(outcome.total_usage().total_tokens, 450);
    assert_eq!(outcome.token_usage.len(), 3);
}

#[tokio::test]
async fn every_failure_repaired_once_makes_five_calls() {
    let fake = Arc::new(
        ScriptedGenerator::new()
            .with_response(EXTERNAL)
            .with_response(BARE)
            .with_response(GOOD)
            .with_response(GOOD)
            .with_response(REFORMATTED_WEAKER),
    );
    let outcome = pipeline(fake.clone()).run().await.unwrap();

    assert_eq!(fake.call_count() as u32, MAX_SERVICE_CALLS);
    assert_eq!(outcome.service_calls, MAX_SERVICE_CALLS);
    assert!(outcome.stages.dependency_repair);
    assert!(outcome.stages.functionality_repair);

    // The published report is the re-score of the formatted text, not the
    // 8/8 report taken after the functionality repair.
    assert_eq!(outcome.source, REFORMATTED_WEAKER);
    assert_eq!(outcome.functionality.score, 6);
    assert!(outcome.functionality.passing);
    assert_eq!(
        outcome.functionality,
        FunctionalityScorer::default().score(REFORMATTED_WEAKER)
    );

    let after_repair = outcome
        .history
        .iter()
        .find_map(|r| match (&r.stage, &r.result) {
            (PipelineStage::FunctionalityRepair, CheckResult::Functionality(report)) => {
                Some(report)
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(after_repair.score, 8);
    assert_ne!(*after_repair, outcome.functionality);

    let published = outcome
        .history
        .iter()
        .find_map(|r| match (&r.stage, &r.result) {
            (PipelineStage::Published, CheckResult::Functionality(report)) => Some(report),
            _ => None,
        })
        .unwrap();
    assert_eq!(*published, outcome.functionality);

    let calls = fake.calls();
    assert!(calls[1].prompt.contains("https://example.com/hero.png"));
    assert!(calls[1].prompt.contains("External image URLs detected"));
    assert!(calls[2].prompt.contains("0/8"));
    assert!(calls[2].prompt.contains("No user input handling found"));
    assert!(calls[2].prompt.ends_with(&format!("{}\n", BARE)));

    let initial = outcome.initial_functionality().unwrap();
    assert!(!initial.passing);
    assert!(outcome.initial_dependencies().unwrap().has_external_deps);
}

#[tokio::test]
async fn unresolved_repairs_do_not_abort() {
    let fake = Arc::new(
        ScriptedGenerator::new()
            .with_response(EXTERNAL)
            .with_response(EXTERNAL)
            .with_response(BARE)
            .with_response(EXTERNAL)
            .with_response(EXTERNAL),
    );
    let outcome = pipeline(fake.clone()).run().await.unwrap();

    assert_eq!(fake.call_count(), 5);
    assert!(!outcome.passing());
    assert!(outcome.dependencies.has_external_deps);

    // No second attempt for either failure class.
    let repairs = outcome
        .trace
        .iter()
        .filter(|s| {
            matches!(
                s,
                PipelineStage::DependencyRepair | PipelineStage::FunctionalityRepair
            )
        })
        .count();
    assert_eq!(repairs, 2);

    let after_repair = outcome
        .history
        .iter()
        .find(|r| r.stage == PipelineStage::DependencyRepair)
        .unwrap();
    assert!(matches!(after_repair.result, CheckResult::Dependencies(_)));
    assert!(!after_repair.result.passed());
}

#[tokio::test]
async fn transport_error_on_first_call_aborts() {
    let fake = Arc::new(
        ScriptedGenerator::new().with_error(GamedayError::Transport("connection refused".into())),
    );
    let err = pipeline(fake.clone()).run().await.unwrap_err();

    assert!(matches!(err, GamedayError::Transport(_)));
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn error_mid_run_aborts_without_outcome() {
    let fake = Arc::new(
        ScriptedGenerator::new()
            .with_response(GOOD)
            .with_error(GamedayError::Api {
                status: 500,
                body: "boom".into(),
            }),
    );
    let err = pipeline(fake.clone()).run().await.unwrap_err();

    assert!(matches!(err, GamedayError::Api { status: 500, .. }));
    assert_eq!(fake.call_count(), 2);
}

#[tokio::test]
async fn disabled_polish_stages_skip_service_calls() {
    let fake = Arc::new(ScriptedGenerator::new().with_response(GOOD));
    let config = GenerationConfig::default()
        .without_visual_enhancement()
        .without_formatting();
    let generator: Arc<dyn TextGenerator> = fake.clone();
    let outcome = GenerationPipeline::new(config, generator)
        .run()
        .await
        .unwrap();

    assert_eq!(fake.call_count(), 1);
    assert_eq!(outcome.source, GOOD);
    assert!(!outcome.stages.visual_enhancement);
    assert!(!outcome.stages.formatting);
    assert_eq!(outcome.trace.last(), Some(&PipelineStage::Published));
}

#[tokio::test]
async fn fenced_output_is_unwrapped() {
    let fenced = format!("```javascript\n{}\n```", GOOD);
    let fake = Arc::new(
        ScriptedGenerator::new()
            .with_response(fenced.clone())
            .with_response(fenced.clone())
            .with_response(fenced),
    );
    let outcome = pipeline(fake).run().await.unwrap();

    assert_eq!(outcome.source, GOOD);
}

#[tokio::test]
async fn font_only_reference_does_not_trigger_dependency_repair() {
    let with_font = format!("{}\nconst font = 'https://fonts.googleapis.com/css?family=Roboto';", GOOD);
    let fake = Arc::new(
        ScriptedGenerator::new()
            .with_response(with_font.clone())
            .with_response(with_font.clone())
            .with_response(with_font),
    );
    let outcome = pipeline(fake.clone()).run().await.unwrap();

    assert_eq!(fake.call_count(), 3);
    assert!(!outcome.stages.dependency_repair);
    assert!(!outcome.dependencies.has_external_deps);
    assert!(outcome
        .dependencies
        .warnings
        .iter()
        .any(|w| w.contains("stylesheet/font")));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_any_call() {
    let fake = Arc::new(ScriptedGenerator::new().with_response(GOOD));
    let generator: Arc<dyn TextGenerator> = fake.clone();
    let config = GenerationConfig::default().with_pass_threshold(150.0);
    let err = GenerationPipeline::new(config, generator)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, GamedayError::InvalidConfig(_)));
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn threshold_controls_repair() {
    // 7/8 = 87.5%: passes at 60, fails at 90.
    let almost = GOOD.replace("console.error(err);", "").replace("try {", "{").replace("catch (err)", "");
    assert_eq!(FunctionalityScorer::default().score(&almost).score, 7);

    let fake = Arc::new(
        ScriptedGenerator::new()
            .with_response(almost.clone())
            .with_response(almost.clone())
            .with_response(almost.clone())
            .with_response(almost.clone()),
    );
    let generator: Arc<dyn TextGenerator> = fake.clone();
    let config = GenerationConfig::default().with_pass_threshold(90.0);
    let outcome = GenerationPipeline::new(config, generator)
        .run()
        .await
        .unwrap();

    assert!(outcome.stages.functionality_repair);
    assert_eq!(fake.call_count(), 4);
    assert!(!outcome.passing());
}
