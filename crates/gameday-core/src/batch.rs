//! Score every published game in a directory.
//!
//! A file that cannot be read is recorded as errored and the batch carries on;
//! only failing to list the directory itself is an error.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Result, ScoreReport};
use crate::publisher::list_game_files;
use crate::scorer::Scorer;

/// Per-file evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameOutcome {
    Scored { report: ScoreReport },
    Errored { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// File name, e.g. `2025-08-27.js`.
    pub name: String,
    pub outcome: GameOutcome,
}

impl GameResult {
    pub fn report(&self) -> Option<&ScoreReport> {
        match &self.outcome {
            GameOutcome::Scored { report } => Some(report),
            GameOutcome::Errored { .. } => None,
        }
    }

    pub fn passing(&self) -> bool {
        self.report().map(|r| r.passing).unwrap_or(false)
    }
}

/// Aggregate over one directory, results in date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub scorer: String,
    pub total: usize,
    pub passing: usize,
    pub failing: usize,
    pub errored: usize,
    /// Mean percentage over scored files; 0 when none were scored.
    pub average_percentage: f64,
    pub results: Vec<GameResult>,
}

impl BatchSummary {
    fn from_results(scorer: &str, results: Vec<GameResult>) -> Self {
        let scored: Vec<&ScoreReport> = results.iter().filter_map(|r| r.report()).collect();
        let passing = scored.iter().filter(|r| r.passing).count();
        let average_percentage = if scored.is_empty() {
            0.0
        } else {
            scored.iter().map(|r| r.percentage).sum::<f64>() / scored.len() as f64
        };
        Self {
            scorer: scorer.to_string(),
            total: results.len(),
            passing,
            failing: scored.len() - passing,
            errored: results.len() - scored.len(),
            average_percentage,
            results,
        }
    }

    /// True only when at least one game was found and every game passed.
    pub fn all_passing(&self) -> bool {
        self.total > 0 && self.passing == self.total
    }

    /// Scored games below threshold, weakest first. Ties keep date order.
    pub fn needing_improvement(&self) -> Vec<&GameResult> {
        let mut weak: Vec<&GameResult> = self
            .results
            .iter()
            .filter(|r| r.report().is_some_and(|report| !report.passing))
            .collect();
        weak.sort_by(|a, b| percentage(a).total_cmp(&percentage(b)));
        weak
    }

    /// Highest-percentage passing games, best first. Ties keep date order.
    pub fn top_performers(&self, n: usize) -> Vec<&GameResult> {
        let mut best: Vec<&GameResult> = self.results.iter().filter(|r| r.passing()).collect();
        best.sort_by(|a, b| percentage(b).total_cmp(&percentage(a)));
        best.truncate(n);
        best
    }
}

fn percentage(result: &GameResult) -> f64 {
    result.report().map(|r| r.percentage).unwrap_or(0.0)
}

/// Score every `YYYY-MM-DD.js` file in `dir`.
pub fn evaluate_games(dir: &Path, scorer: &dyn Scorer) -> Result<BatchSummary> {
    let files = list_game_files(dir)?;
    let mut results = Vec::with_capacity(files.len());

    for (_, path) in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outcome = match std::fs::read_to_string(&path) {
            Ok(source) => GameOutcome::Scored {
                report: scorer.score(&source),
            },
            Err(e) => {
                warn!(file = %name, error = %e, "failed to read game");
                GameOutcome::Errored {
                    error: e.to_string(),
                }
            }
        };
        results.push(GameResult { name, outcome });
    }

    let summary = BatchSummary::from_results(scorer.name(), results);
    info!(
        scorer = %summary.scorer,
        total = summary.total,
        passing = summary.passing,
        failing = summary.failing,
        errored = summary.errored,
        "batch evaluated"
    );
    Ok(summary)
}
