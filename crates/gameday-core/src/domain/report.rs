//! Check reports produced by the scorers and the dependency auditor.

use serde::{Deserialize, Serialize};

/// Result of one heuristic scoring pass over a game source.
///
/// Reports are never mutated after creation; every pipeline stage that
/// re-checks the source produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Name of the scorer that produced this report.
    pub scorer: String,

    /// Points awarded.
    pub score: u32,

    /// Points available.
    pub max_score: u32,

    /// `100 * score / max_score`.
    pub percentage: f64,

    /// Whether `percentage` reached the scorer's threshold.
    pub passing: bool,

    /// Missing required features, in category order.
    pub issues: Vec<String>,

    /// Missing optional features, in category order.
    pub warnings: Vec<String>,
}

impl ScoreReport {
    /// Build a report, deriving `percentage` and `passing` from the totals.
    pub fn new(
        scorer: impl Into<String>,
        score: u32,
        max_score: u32,
        threshold: f64,
        issues: Vec<String>,
        warnings: Vec<String>,
    ) -> Self {
        let percentage = if max_score == 0 {
            0.0
        } else {
            100.0 * f64::from(score) / f64::from(max_score)
        };
        Self {
            scorer: scorer.into(),
            score,
            max_score,
            percentage,
            passing: percentage >= threshold,
            issues,
            warnings,
        }
    }
}

/// Result of scanning a game source for externally hosted resources.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyReport {
    pub has_external_deps: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    /// Distinct canvas drawing methods called in the source.
    pub canvas_method_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_derived_from_totals() {
        let report = ScoreReport::new("functionality", 6, 8, 60.0, vec![], vec![]);
        assert_eq!(report.percentage, 75.0);
        assert!(report.passing);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let report = ScoreReport::new("accessibility", 6, 10, 60.0, vec![], vec![]);
        assert!(report.passing);

        let report = ScoreReport::new("accessibility", 5, 10, 60.0, vec![], vec![]);
        assert!(!report.passing);
    }

    #[test]
    fn test_zero_max_score_never_passes() {
        let report = ScoreReport::new("empty", 0, 0, 60.0, vec![], vec![]);
        assert_eq!(report.percentage, 0.0);
        assert!(!report.passing);
    }
}
