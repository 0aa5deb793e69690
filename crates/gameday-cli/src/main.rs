//! Gameday CLI
//!
//! The `gameday` command generates, checks and publishes the Game of the Day.
//!
//! ## Commands
//!
//! - `generate`: Run the generation pipeline and publish today's game
//! - `test-all`: Score every published game and fail unless all pass
//! - `score`: Score a single game file
//! - `audit`: Scan a single game file for external resources
//! - `reindex`: Rebuild `index.json` from the games on disk

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};

use gameday_core::config::{DEFAULT_GAMES_DIR, DEFAULT_MODEL, DEFAULT_PASS_THRESHOLD, DEFAULT_THEME};
use gameday_core::obs::RunSpan;
use gameday_core::{
    evaluate_games, AccessibilityScorer, ArtifactPublisher, BatchSummary, DependencyAuditor,
    FunctionalityScorer, GameArtifact, GenerationConfig, GenerationPipeline, OpenAiClient,
    OpenAiConfig, ScoreReport, Scorer, TextGenerator,
};

#[derive(Parser)]
#[command(name = "gameday")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate, check and publish a daily browser game", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, check, repair and publish a game
    Generate {
        /// Directory games are published to
        #[arg(long, env = "GAMEDAY_GAMES_DIR", default_value = DEFAULT_GAMES_DIR)]
        games_dir: PathBuf,

        /// Theme passed to the generation prompt
        #[arg(long, env = "GAMEDAY_THEME", default_value = DEFAULT_THEME)]
        theme: String,

        /// Model identifier sent to the generation service
        #[arg(long, env = "GAMEDAY_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// Functionality pass threshold in percent
        #[arg(long, env = "GAMEDAY_THRESHOLD", default_value_t = DEFAULT_PASS_THRESHOLD)]
        threshold: f64,

        /// Publication date (default: today, local time)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Skip the visual enhancement pass
        #[arg(long)]
        skip_visual: bool,

        /// Skip the formatting pass
        #[arg(long)]
        skip_format: bool,
    },

    /// Score every published game; exits non-zero unless all pass
    TestAll {
        /// Directory holding published games
        #[arg(long, env = "GAMEDAY_GAMES_DIR", default_value = DEFAULT_GAMES_DIR)]
        games_dir: PathBuf,

        /// Which check to run
        #[arg(long, value_enum, default_value_t = Variant::Functionality)]
        variant: Variant,

        /// Pass threshold in percent
        #[arg(long, env = "GAMEDAY_THRESHOLD", default_value_t = DEFAULT_PASS_THRESHOLD)]
        threshold: f64,

        /// Number of top performers to list
        #[arg(long, default_value = "3")]
        top: usize,
    },

    /// Score one game file; exits non-zero if it fails
    Score {
        /// Path to the game's JavaScript file
        file: PathBuf,

        /// Which check to run
        #[arg(long, value_enum, default_value_t = Variant::Functionality)]
        variant: Variant,

        /// Pass threshold in percent
        #[arg(long, env = "GAMEDAY_THRESHOLD", default_value_t = DEFAULT_PASS_THRESHOLD)]
        threshold: f64,
    },

    /// Audit one game file for external resources; exits non-zero if any found
    Audit {
        /// Path to the game's JavaScript file
        file: PathBuf,
    },

    /// Rebuild index.json from the games on disk
    Reindex {
        /// Directory holding published games
        #[arg(long, env = "GAMEDAY_GAMES_DIR", default_value = DEFAULT_GAMES_DIR)]
        games_dir: PathBuf,
    },
}

/// Heuristic check to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    Functionality,
    Accessibility,
}

impl Variant {
    fn scorer(self, threshold: f64) -> Box<dyn Scorer> {
        match self {
            Variant::Functionality => Box::new(FunctionalityScorer::new(threshold)),
            Variant::Accessibility => Box::new(AccessibilityScorer::new(threshold)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    gameday_core::telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Generate {
            games_dir,
            theme,
            model,
            threshold,
            date,
            skip_visual,
            skip_format,
        } => {
            let mut config = GenerationConfig::default()
                .with_games_dir(games_dir)
                .with_theme(theme)
                .with_model(model)
                .with_pass_threshold(threshold);
            if skip_visual {
                config = config.without_visual_enhancement();
            }
            if skip_format {
                config = config.without_formatting();
            }
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let client = OpenAiClient::new(
                OpenAiConfig::from_env().context("Failed to configure the generation service")?,
            )?;
            cmd_generate(config, Arc::new(client), date).await
        }
        Commands::TestAll {
            games_dir,
            variant,
            threshold,
            top,
        } => cmd_test_all(&games_dir, variant, threshold, top),
        Commands::Score {
            file,
            variant,
            threshold,
        } => cmd_score(&file, variant, threshold),
        Commands::Audit { file } => cmd_audit(&file),
        Commands::Reindex { games_dir } => cmd_reindex(&games_dir),
    }
}

/// Run the pipeline once and publish the result.
async fn cmd_generate(
    config: GenerationConfig,
    generator: Arc<dyn TextGenerator>,
    date: NaiveDate,
) -> Result<()> {
    let publisher = ArtifactPublisher::new(config.games_dir.clone());
    if let Some(previous) = publisher.read_latest()? {
        info!(bytes = previous.len(), "previous latest.js found");
    }

    let pipeline = GenerationPipeline::new(config, generator);
    let outcome = pipeline.run().await.context("Generation run failed")?;

    let _span = RunSpan::enter(&outcome.run_id);
    let passing = outcome.passing();
    let artifact = GameArtifact::from_outcome(date, outcome);
    let paths = publisher
        .publish(&artifact)
        .with_context(|| format!("Failed to publish game for {}", artifact.date_key()))?;

    let meta = artifact.metadata();
    println!("Published {}", paths.source.display());
    println!("  Run ID:        {}", meta.run_id);
    println!("  Service calls: {}", meta.service_calls);
    println!("  Total tokens:  {}", meta.total_tokens);
    println!("  Size:          {} bytes", meta.output_bytes);
    println!("  SHA-256:       {}", meta.source_sha256);
    print_score(&meta.functionality);
    if meta.dependencies.has_external_deps {
        println!("  External dependencies remain:");
        for issue in &meta.dependencies.issues {
            println!("    - {}", issue);
        }
    }

    if !passing {
        warn!(date = %artifact.date_key(), "published game is below the functionality threshold");
    }
    Ok(())
}

/// Score every published game with the chosen check.
fn cmd_test_all(games_dir: &Path, variant: Variant, threshold: f64, top: usize) -> Result<()> {
    let scorer = variant.scorer(threshold);
    let summary = evaluate_games(games_dir, scorer.as_ref())
        .with_context(|| format!("Failed to read games from {:?}", games_dir))?;

    print_summary(&summary, top);

    if summary.all_passing() {
        println!("\n✓ All games passed!");
        Ok(())
    } else if summary.total == 0 {
        anyhow::bail!("No games found in {:?}", games_dir)
    } else {
        anyhow::bail!(
            "{} of {} games did not pass the {} check",
            summary.total - summary.passing,
            summary.total,
            summary.scorer
        )
    }
}

fn cmd_score(file: &Path, variant: Variant, threshold: f64) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {:?}", file))?;
    let report = variant.scorer(threshold).score(&source);

    println!("{}", file.display());
    print_score(&report);

    if !report.passing {
        anyhow::bail!("{} check failed", report.scorer);
    }
    Ok(())
}

fn cmd_audit(file: &Path) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {:?}", file))?;
    let report = DependencyAuditor::default().audit(&source);

    println!("{}", file.display());
    println!(
        "  External dependencies: {}",
        if report.has_external_deps { "✗ found" } else { "✓ none" }
    );
    println!("  Canvas drawing methods: {}", report.canvas_method_count);
    for issue in &report.issues {
        println!("  ✗ {}", issue);
    }
    for warning in &report.warnings {
        println!("  ! {}", warning);
    }

    if report.has_external_deps {
        anyhow::bail!("External dependencies detected");
    }
    Ok(())
}

fn cmd_reindex(games_dir: &Path) -> Result<()> {
    let dates = ArtifactPublisher::new(games_dir)
        .rebuild_index()
        .with_context(|| format!("Failed to rebuild index in {:?}", games_dir))?;

    println!("Indexed {} games", dates.len());
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!("  {} .. {}", first, last);
    }
    Ok(())
}

fn print_score(report: &ScoreReport) {
    println!(
        "  {}: {}/{} ({:.1}%) {}",
        report.scorer,
        report.score,
        report.max_score,
        report.percentage,
        if report.passing { "✓ PASSED" } else { "✗ FAILED" }
    );
    for issue in &report.issues {
        println!("    ✗ {}", issue);
    }
    for warning in &report.warnings {
        println!("    ! {}", warning);
    }
}

fn print_summary(summary: &BatchSummary, top: usize) {
    println!("Checked {} games ({})", summary.total, summary.scorer);
    for result in &summary.results {
        match result.report() {
            Some(report) => {
                let status = if report.passing { "✓" } else { "✗" };
                println!("  {} {} {:.1}%", status, result.name, report.percentage);
            }
            None => println!("  ! {} could not be read", result.name),
        }
    }

    println!();
    println!("Passing:  {}", summary.passing);
    println!("Failing:  {}", summary.failing);
    println!("Errored:  {}", summary.errored);
    println!("Average:  {:.1}%", summary.average_percentage);

    let weak = summary.needing_improvement();
    if !weak.is_empty() {
        println!("\nNeeds improvement:");
        for result in weak {
            if let Some(report) = result.report() {
                println!("  - {} ({:.1}%)", result.name, report.percentage);
                for issue in &report.issues {
                    println!("      {}", issue);
                }
            }
        }
    }

    let best = summary.top_performers(top);
    if !best.is_empty() {
        println!("\nTop performers:");
        for result in best {
            if let Some(report) = result.report() {
                println!("  - {} ({:.1}%)", result.name, report.percentage);
            }
        }
    }
}
