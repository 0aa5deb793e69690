//! External-resource audit for generated game sources.
//!
//! A game must be self-contained: everything is drawn on the canvas and every
//! sound is synthesized with the Web Audio API. Any URL pointing at an image,
//! audio clip, script, stylesheet or font is an issue, because a hosted asset
//! can disappear or be blocked. Thin canvas usage only earns a warning.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DependencyReport;

/// Canvas drawing methods counted toward the drawing-variety warning.
pub const CANVAS_METHODS: &[&str] = &[
    "fillRect",
    "strokeRect",
    "clearRect",
    "fillText",
    "strokeText",
    "arc",
    "arcTo",
    "beginPath",
    "closePath",
    "moveTo",
    "lineTo",
    "fill",
    "stroke",
    "rect",
    "ellipse",
    "quadraticCurveTo",
    "bezierCurveTo",
    "createLinearGradient",
    "createRadialGradient",
    "drawImage",
];

/// Fewer distinct drawing calls than this produces a warning.
pub const MIN_CANVAS_METHODS: u32 = 3;

/// Number of example URLs quoted per issue.
const MAX_REPORTED_URLS: usize = 3;

const URL_PREFIX: &str = r#"(?:https?:)?//[^\s'"`()<>]+?"#;
const URL_SUFFIX: &str = r#"(?:[?#][^\s'"`()<>]*)?"#;

/// Kind of external resource a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Image,
    Audio,
    Script,
    Stylesheet,
}

impl ResourceKind {
    fn label(self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Audio => "audio",
            ResourceKind::Script => "script",
            ResourceKind::Stylesheet => "stylesheet/font",
        }
    }

    /// Whether a match makes the game depend on an external host. Stylesheet
    /// and font references only degrade styling, so they are warnings.
    pub fn is_blocking(self) -> bool {
        !matches!(self, ResourceKind::Stylesheet)
    }
}

/// A pattern that identifies one kind of hosted resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRule {
    pub kind: ResourceKind,
    pub regex_pattern: String,
}

impl DependencyRule {
    /// URL ending in one of the given file extensions.
    pub fn extensions(kind: ResourceKind, extensions: &[&str]) -> Self {
        let alternatives = extensions
            .iter()
            .map(|e| regex::escape(e))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            kind,
            regex_pattern: format!(
                r"(?i){}\.(?:{})\b{}",
                URL_PREFIX, alternatives, URL_SUFFIX
            ),
        }
    }

    /// Any URL on one of the given hosts.
    pub fn hosts(kind: ResourceKind, hosts: &[&str]) -> Self {
        let alternatives = hosts
            .iter()
            .map(|h| regex::escape(h))
            .collect::<Vec<_>>()
            .join("|");
        Self {
            kind,
            regex_pattern: format!(r#"(?i)(?:https?:)?//(?:{})[^\s'"`()<>]*"#, alternatives),
        }
    }
}

/// Default rule set: images, audio, scripts (by extension or CDN host) and
/// stylesheets/fonts.
pub fn default_rules() -> Vec<DependencyRule> {
    vec![
        DependencyRule::extensions(
            ResourceKind::Image,
            &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico"],
        ),
        DependencyRule::extensions(
            ResourceKind::Audio,
            &["mp3", "wav", "ogg", "m4a", "aac", "flac"],
        ),
        DependencyRule::extensions(ResourceKind::Script, &["js", "mjs"]),
        DependencyRule::hosts(
            ResourceKind::Script,
            &[
                "cdn.jsdelivr.net",
                "unpkg.com",
                "cdnjs.cloudflare.com",
                "code.jquery.com",
                "ajax.googleapis.com",
            ],
        ),
        DependencyRule::extensions(
            ResourceKind::Stylesheet,
            &["css", "woff", "woff2", "ttf", "otf"],
        ),
        DependencyRule::hosts(
            ResourceKind::Stylesheet,
            &["fonts.googleapis.com", "fonts.gstatic.com"],
        ),
    ]
}

/// Scans sources for hosted resources and thin canvas usage.
#[derive(Debug, Clone)]
pub struct DependencyAuditor {
    rules: Vec<(ResourceKind, Regex)>,
    canvas_call: Option<Regex>,
}

impl Default for DependencyAuditor {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl DependencyAuditor {
    /// Build an auditor from rules. Rules whose pattern does not compile are skipped.
    pub fn new(rules: Vec<DependencyRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                Regex::new(&rule.regex_pattern)
                    .ok()
                    .map(|re| (rule.kind, re))
            })
            .collect();
        let canvas_call = Regex::new(&format!(
            r"\.({})\s*\(",
            CANVAS_METHODS.join("|")
        ))
        .ok();
        Self { rules, canvas_call }
    }

    /// Audit a game source. Never fails; unmatched input yields an empty report.
    pub fn audit(&self, source: &str) -> DependencyReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        // Group matches by kind so host and extension rules for the same kind
        // produce a single issue.
        let mut kinds: Vec<ResourceKind> = Vec::new();
        let mut urls_by_kind: Vec<BTreeSet<String>> = Vec::new();
        for (kind, re) in &self.rules {
            let found: BTreeSet<String> = re
                .find_iter(source)
                .map(|m| m.as_str().to_string())
                .collect();
            if found.is_empty() {
                continue;
            }
            match kinds.iter().position(|k| k == kind) {
                Some(idx) => urls_by_kind[idx].extend(found),
                None => {
                    kinds.push(*kind);
                    urls_by_kind.push(found);
                }
            }
        }

        for (kind, urls) in kinds.iter().zip(&urls_by_kind) {
            let examples: Vec<&str> = urls
                .iter()
                .take(MAX_REPORTED_URLS)
                .map(String::as_str)
                .collect();
            let finding = format!(
                "External {} URLs detected ({}): {}",
                kind.label(),
                urls.len(),
                examples.join(", ")
            );
            if kind.is_blocking() {
                issues.push(finding);
            } else {
                warnings.push(finding);
            }
        }

        let canvas_method_count = self.count_canvas_methods(source);
        if canvas_method_count < MIN_CANVAS_METHODS {
            warnings.push(format!(
                "Only {} distinct canvas drawing method(s) used; expected at least {}",
                canvas_method_count, MIN_CANVAS_METHODS
            ));
        }

        if source.contains("new Audio(") {
            warnings.push(
                "HTMLAudioElement usage found; synthesize sounds with the Web Audio API"
                    .to_string(),
            );
        }
        if source.contains("new Image(") {
            warnings.push("Image element usage found; draw graphics on the canvas".to_string());
        }

        DependencyReport {
            has_external_deps: !issues.is_empty(),
            issues,
            warnings,
            canvas_method_count,
        }
    }

    fn count_canvas_methods(&self, source: &str) -> u32 {
        let Some(re) = &self.canvas_call else {
            return 0;
        };
        let distinct: BTreeSet<&str> = re
            .captures_iter(source)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        distinct.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_GAME: &str = r#"
        const ctx = canvas.getContext('2d');
        ctx.beginPath();
        ctx.arc(10, 10, 5, 0, Math.PI * 2);
        ctx.fill();
        ctx.fillRect(0, 0, 720, 480);
        const audio = new AudioContext();
    "#;

    #[test]
    fn clean_source_has_no_external_deps() {
        let report = DependencyAuditor::default().audit(CLEAN_GAME);
        assert!(!report.has_external_deps);
        assert!(report.issues.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(report.canvas_method_count, 4);
    }

    #[test]
    fn image_url_is_an_issue() {
        let report = DependencyAuditor::default().audit("img.src = 'https://example.com/x.png';");
        assert!(report.has_external_deps);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("image"));
        assert!(report.issues[0].contains("https://example.com/x.png"));
    }

    #[test]
    fn audio_and_script_urls_are_separate_issues() {
        let source = r#"
            const a = "http://sounds.example.org/boom.MP3?v=2";
            load("https://cdn.jsdelivr.net/npm/phaser@3/dist/phaser.min.js");
        "#;
        let report = DependencyAuditor::default().audit(source);
        assert!(report.has_external_deps);
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().any(|i| i.contains("audio")));
        assert!(report.issues.iter().any(|i| i.contains("script")));
    }

    #[test]
    fn cdn_host_and_extension_matches_collapse_into_one_issue() {
        let source = "import('https://unpkg.com/lib'); load('https://x.org/a.js');";
        let report = DependencyAuditor::default().audit(source);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("script URLs detected (2)"));
    }

    #[test]
    fn protocol_relative_urls_are_detected() {
        let report = DependencyAuditor::default().audit("src = '//cdn.example.com/s/hero.png';");
        assert!(report.has_external_deps);
        assert!(report.issues[0].contains("image"));
    }

    #[test]
    fn font_only_source_is_a_warning_not_a_dependency() {
        let report = DependencyAuditor::default()
            .audit("const f = 'https://fonts.googleapis.com/css?family=Roboto';");
        assert!(!report.has_external_deps);
        assert!(report.issues.is_empty());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("External stylesheet/font URLs detected (1)")));
    }

    #[test]
    fn font_alongside_image_keeps_font_as_warning() {
        let source = "a = '//fonts.gstatic.com/s/font.woff2'; b = 'https://x.org/tile.png';";
        let report = DependencyAuditor::default().audit(source);
        assert!(report.has_external_deps);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("image"));
        assert!(report.warnings.iter().any(|w| w.contains("stylesheet/font")));
    }

    #[test]
    fn file_names_without_urls_are_not_flagged() {
        let report = DependencyAuditor::default().audit("const name = 'player.png'; // sprite.js");
        assert!(!report.has_external_deps);
    }

    #[test]
    fn thin_canvas_usage_is_a_warning_only() {
        let report = DependencyAuditor::default().audit("ctx.fillRect(0, 0, 1, 1);");
        assert!(!report.has_external_deps);
        assert_eq!(report.canvas_method_count, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("canvas"));
    }

    #[test]
    fn repeated_calls_count_once() {
        let report =
            DependencyAuditor::default().audit("ctx.fill(); ctx.fill(); ctx.fill (); ctx.stroke();");
        assert_eq!(report.canvas_method_count, 2);
    }

    #[test]
    fn media_elements_produce_warnings() {
        let report = DependencyAuditor::default().audit("const s = new Audio(); const i = new Image();");
        assert!(!report.has_external_deps);
        assert!(report.warnings.iter().any(|w| w.contains("Web Audio")));
        assert!(report.warnings.iter().any(|w| w.contains("Image element")));
    }

    #[test]
    fn empty_and_malformed_input_do_not_panic() {
        let auditor = DependencyAuditor::default();
        let report = auditor.audit("");
        assert!(!report.has_external_deps);
        assert_eq!(report.canvas_method_count, 0);

        let report = auditor.audit("https:// \u{0}\u{FFFD} //// .png ((( `");
        assert!(!report.has_external_deps);
    }

    #[test]
    fn audit_is_pure() {
        let auditor = DependencyAuditor::default();
        let source = "x = 'https://example.com/a.gif'; ctx.arc(); ctx.lineTo();";
        assert_eq!(auditor.audit(source), auditor.audit(source));
    }

    #[test]
    fn invalid_rules_are_skipped() {
        let auditor = DependencyAuditor::new(vec![DependencyRule {
            kind: ResourceKind::Image,
            regex_pattern: "(unclosed".to_string(),
        }]);
        let report = auditor.audit("https://example.com/x.png");
        assert!(!report.has_external_deps);
    }
}
