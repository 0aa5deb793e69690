//! Heuristic feature scoring for generated game sources.
//!
//! Scoring is keyword presence only: the source is lowercased and each
//! category awards its weight when any of its keywords occurs. Scorers are
//! pure and deterministic. They sit behind the [`Scorer`] trait so a stricter
//! checker can replace them without touching the pipeline.

use regex::Regex;

use crate::config::DEFAULT_PASS_THRESHOLD;
use crate::domain::ScoreReport;

/// A heuristic quality check over JavaScript source text.
pub trait Scorer: Send + Sync {
    /// Stable name recorded in each report.
    fn name(&self) -> &'static str;

    /// Score the source. Must not panic on any input.
    fn score(&self, source: &str) -> ScoreReport;
}

/// What a category contributes when none of its keywords match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Miss {
    Issue(&'static str),
    Warning(&'static str),
}

/// A weighted keyword category.
#[derive(Debug, Clone, Copy)]
struct Category {
    weight: u32,
    keywords: &'static [&'static str],
    miss: Miss,
}

impl Category {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| lowered.contains(k.to_lowercase().as_str()))
    }
}

/// Record a category hit or miss into the running totals.
fn apply(
    category: &Category,
    lowered: &str,
    score: &mut u32,
    issues: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    if category.matches(lowered) {
        *score += category.weight;
        return;
    }
    match category.miss {
        Miss::Issue(msg) => issues.push(msg.to_string()),
        Miss::Warning(msg) => warnings.push(msg.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Functionality
// ---------------------------------------------------------------------------

const FUNCTIONALITY_CATEGORIES: [Category; 5] = [
    Category {
        weight: 2,
        keywords: &["canvas", "getContext", "requestAnimationFrame", "addEventListener"],
        miss: Miss::Issue("No game initialization found"),
    },
    Category {
        weight: 2,
        keywords: &["keydown", "keyup", "keypress", "click", "mousedown", "mouseup", "touchstart"],
        miss: Miss::Issue("No user input handling found"),
    },
    Category {
        weight: 2,
        keywords: &["requestAnimationFrame", "setInterval", "setTimeout", "update", "draw"],
        miss: Miss::Issue("No game loop/animation found"),
    },
    Category {
        weight: 1,
        keywords: &["try", "catch", "console.error", "console.warn"],
        miss: Miss::Warning("No error handling found"),
    },
    Category {
        weight: 1,
        keywords: &["score", "lives", "level", "gameState", "player", "enemy", "object"],
        miss: Miss::Warning("No game state management found"),
    },
];

/// Basic playability check: initialization, input, loop, error handling and
/// state (weights 2, 2, 2, 1, 1; max 8).
#[derive(Debug, Clone)]
pub struct FunctionalityScorer {
    threshold: f64,
}

impl Default for FunctionalityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_THRESHOLD)
    }
}

impl FunctionalityScorer {
    pub const NAME: &'static str = "functionality";
    pub const MAX_SCORE: u32 = 8;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Scorer for FunctionalityScorer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn score(&self, source: &str) -> ScoreReport {
        let lowered = source.to_lowercase();
        let mut score = 0;
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        for category in &FUNCTIONALITY_CATEGORIES {
            apply(category, &lowered, &mut score, &mut issues, &mut warnings);
        }

        ScoreReport::new(
            Self::NAME,
            score,
            Self::MAX_SCORE,
            self.threshold,
            issues,
            warnings,
        )
    }
}

// ---------------------------------------------------------------------------
// Accessibility
// ---------------------------------------------------------------------------

const KEYBOARD: Category = Category {
    weight: 2,
    keywords: &["keydown", "keyup", "keypress", "arrow", "space", "enter"],
    miss: Miss::Issue("No keyboard controls found"),
};

const TEXT_ALTERNATIVES: Category = Category {
    weight: 2,
    keywords: &["alt", "aria-label", "title", "textContent", "innerText"],
    miss: Miss::Warning("No text alternatives for visual elements"),
};

const INSTRUCTIONS: Category = Category {
    weight: 1,
    keywords: &["instruction", "help", "guide", "tutorial", "explain"],
    miss: Miss::Warning("No clear instructions found"),
};

const ACCESSIBLE_ERRORS: Category = Category {
    weight: 1,
    keywords: &["error", "catch", "try", "invalid", "wrong", "incorrect"],
    miss: Miss::Warning("No error handling found"),
};

const AUDIO_KEYWORDS: &[&str] = &["audio", "sound", "playsound", "audiocontext"];
const VISUAL_CUES: &[&str] = &["flash", "blink", "pulse", "glow", "shake", "bounce"];

/// Line-level patterns that suggest game logic keyed on colour alone.
const COLOR_DEPENDENT_PATTERNS: &[&str] = &[
    r"if[^\n]*color[^\n]*===?",
    r"color[^\n]*\b(red|green|blue|yellow|orange)\b",
];

/// Accessibility check: keyboard, colour independence, text alternatives,
/// audio alternatives, instructions and error feedback (weights 2, 2, 2, 2,
/// 1, 1; max 10).
#[derive(Debug, Clone)]
pub struct AccessibilityScorer {
    threshold: f64,
    color_patterns: Vec<Regex>,
}

impl Default for AccessibilityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_THRESHOLD)
    }
}

impl AccessibilityScorer {
    pub const NAME: &'static str = "accessibility";
    pub const MAX_SCORE: u32 = 10;

    pub fn new(threshold: f64) -> Self {
        let color_patterns = COLOR_DEPENDENT_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            threshold,
            color_patterns,
        }
    }

    fn color_dependent(&self, lowered: &str) -> bool {
        self.color_patterns.iter().any(|re| re.is_match(lowered))
    }
}

impl Scorer for AccessibilityScorer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn score(&self, source: &str) -> ScoreReport {
        let lowered = source.to_lowercase();
        let mut score = 0;
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        apply(&KEYBOARD, &lowered, &mut score, &mut issues, &mut warnings);

        if self.color_dependent(&lowered) {
            warnings.push("Game logic may depend on colors".to_string());
        } else {
            score += 2;
        }

        apply(
            &TEXT_ALTERNATIVES,
            &lowered,
            &mut score,
            &mut issues,
            &mut warnings,
        );

        // No audio at all earns partial credit; audio needs a visual twin for full credit.
        if AUDIO_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            if VISUAL_CUES.iter().any(|c| lowered.contains(c)) {
                score += 2;
            } else {
                warnings.push("Audio cues without visual alternatives".to_string());
            }
        } else {
            score += 1;
        }

        apply(&INSTRUCTIONS, &lowered, &mut score, &mut issues, &mut warnings);
        apply(
            &ACCESSIBLE_ERRORS,
            &lowered,
            &mut score,
            &mut issues,
            &mut warnings,
        );

        ScoreReport::new(
            Self::NAME,
            score,
            Self::MAX_SCORE,
            self.threshold,
            issues,
            warnings,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_GAME: &str = r#"
        const canvas = document.createElement('canvas');
        const ctx = canvas.getContext('2d');
        let score = 0;
        document.addEventListener('keydown', (e) => { player.x += 1; });
        function update() {}
        function draw() { ctx.fillRect(0, 0, 10, 10); }
        function loop() {
            try { update(); draw(); } catch (err) { console.error(err); }
            requestAnimationFrame(loop);
        }
    "#;

    #[test]
    fn empty_source_scores_zero() {
        let report = FunctionalityScorer::default().score("");
        assert_eq!(report.score, 0);
        assert_eq!(report.max_score, 8);
        assert_eq!(report.percentage, 0.0);
        assert!(!report.passing);
        assert_eq!(report.issues.len(), 3);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn full_game_scores_max() {
        let report = FunctionalityScorer::default().score(FULL_GAME);
        assert_eq!(report.score, 8);
        assert_eq!(report.percentage, 100.0);
        assert!(report.passing);
        assert!(report.issues.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        let upper = FunctionalityScorer::default().score("GETCONTEXT KEYDOWN DRAW");
        let lower = FunctionalityScorer::default().score("getcontext keydown draw");
        assert_eq!(upper, lower);
        assert_eq!(upper.score, 6);
        assert!(upper.passing);
    }

    #[test]
    fn issues_keep_category_order() {
        let report = FunctionalityScorer::default().score("let score = 1; try {} catch {}");
        assert_eq!(
            report.issues,
            vec![
                "No game initialization found",
                "No user input handling found",
                "No game loop/animation found",
            ]
        );
        assert!(report.warnings.is_empty());
        assert_eq!(report.score, 2);
    }

    #[test]
    fn threshold_is_configurable() {
        let report = FunctionalityScorer::new(90.0).score("canvas keydown draw");
        assert_eq!(report.score, 6);
        assert!(!report.passing);
    }

    #[test]
    fn accessibility_empty_source_gets_default_credit() {
        let report = AccessibilityScorer::default().score("");
        // Colour independence (2) and no audio (1).
        assert_eq!(report.score, 3);
        assert_eq!(report.max_score, 10);
        assert!(!report.passing);
        assert_eq!(report.issues, vec!["No keyboard controls found"]);
    }

    #[test]
    fn accessibility_flags_colour_logic() {
        let report = AccessibilityScorer::default().score("if (tile.color === target) {}");
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("depend on colors")));
    }

    #[test]
    fn accessibility_rewards_audio_with_visual_cue() {
        let with_cue = AccessibilityScorer::default().score("new AudioContext(); flash();");
        let without_cue = AccessibilityScorer::default().score("new AudioContext();");
        assert_eq!(with_cue.score, without_cue.score + 2);
        assert!(without_cue
            .warnings
            .iter()
            .any(|w| w.contains("visual alternatives")));
    }

    #[test]
    fn accessibility_well_formed_game_passes() {
        let source = r#"
            // Instructions: use arrow keys
            document.addEventListener('keydown', onKey);
            canvas.setAttribute('aria-label', 'Game board');
            const audio = new AudioContext();
            function hit() { playTone(); flash(); }
            try { start(); } catch (error) { showError(); }
        "#;
        let report = AccessibilityScorer::default().score(source);
        assert_eq!(report.score, 10);
        assert!(report.passing);
    }

    #[test]
    fn scorers_are_usable_as_trait_objects() {
        let scorers: Vec<Box<dyn Scorer>> = vec![
            Box::new(FunctionalityScorer::default()),
            Box::new(AccessibilityScorer::default()),
        ];
        let names: Vec<&str> = scorers.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["functionality", "accessibility"]);
        for scorer in &scorers {
            assert_eq!(scorer.score(FULL_GAME), scorer.score(FULL_GAME));
        }
    }
}
