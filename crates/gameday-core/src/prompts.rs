//! Prompt templates for each pipeline stage.
//!
//! Every builder is a pure string template. None of them talks to the
//! generation service.

use crate::domain::{DependencyReport, ScoreReport};

/// DOM element the game must render into.
pub const STAGE_ELEMENT_ID: &str = "game-of-the-day-stage";
pub const GAME_WIDTH: u32 = 720;
pub const GAME_HEIGHT: u32 = 480;

const PERSONA: &str = "You are an expert JavaScript game developer who builds polished, \
self-contained browser games for a daily \"Game of the Day\" page.";

const OUTPUT_RULE: &str = "Output only valid JavaScript code: no explanation, no HTML, \
no CSS and no Markdown formatting or code fences.";

fn hard_constraints() -> String {
    format!(
        "Hard requirements:\n\
         - Render everything with the Canvas 2D API on a canvas you create inside the HTML element with id '{id}'.\n\
         - The game area must be exactly {w}px wide by {h}px tall to match the frame in the page.\n\
         - Produce all sound with the Web Audio API (AudioContext/oscillators); do not use audio files.\n\
         - Do not load any external assets: no image, audio, font, stylesheet or script URLs.\n\
         - {output}",
        id = STAGE_ELEMENT_ID,
        w = GAME_WIDTH,
        h = GAME_HEIGHT,
        output = OUTPUT_RULE,
    )
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn with_source(instructions: String, source: &str) -> String {
    format!(
        "{instructions}\n\n{output}\n\nCurrent game code:\n{source}\n",
        instructions = instructions,
        output = OUTPUT_RULE,
        source = source,
    )
}

/// `generating`: initial generation for the day's theme.
pub fn generation_prompt(theme: &str) -> String {
    format!(
        "{persona}\n\n\
         Generate today's Game of the Day as a playable JavaScript game. Theme: {theme}.\n\
         The game should teach basic math, have cool visuals, and include fun characters. \
         Use your own creativity and imagination.\n\n\
         {constraints}\n\n\
         Include a clear initialization step, keyboard and mouse/touch input handling, \
         a requestAnimationFrame game loop, try/catch error handling around the loop, \
         and explicit game state (score, level, lives).",
        persona = PERSONA,
        theme = theme,
        constraints = hard_constraints(),
    )
}

/// `dependency_repair`: replace external references with canvas/Web Audio equivalents.
pub fn dependency_repair_prompt(source: &str, report: &DependencyReport) -> String {
    let mut instructions = format!(
        "{persona}\n\n\
         The game below references externally hosted resources. Rewrite it so it is fully \
         self-contained: replace every external image with shapes drawn on the canvas, every \
         external sound with Web Audio API synthesis, and remove every external script, \
         stylesheet or font. Keep the gameplay otherwise identical.",
        persona = PERSONA,
    );
    if !report.issues.is_empty() {
        instructions.push_str("\n\nProblems found:\n");
        instructions.push_str(&bullet_list(&report.issues));
    }
    instructions.push_str("\n\n");
    instructions.push_str(&hard_constraints());
    with_source(instructions, source)
}

/// `functionality_repair`: add missing functionality primitives without changing the game.
pub fn functionality_repair_prompt(source: &str, report: &ScoreReport) -> String {
    let mut instructions = format!(
        "{persona}\n\n\
         The game below scored {score}/{max} ({pct:.1}%) on a basic functionality check. \
         Preserve its theme, characters and game logic, and make sure it has:\n\
         - initialization (create the canvas and get its 2D context)\n\
         - user input handling (keyboard plus mouse or touch listeners)\n\
         - a game loop driven by requestAnimationFrame with update and draw steps\n\
         - error handling (try/catch with console.error)\n\
         - game state management (score, level, lives, player)",
        persona = PERSONA,
        score = report.score,
        max = report.max_score,
        pct = report.percentage,
    );
    let findings: Vec<String> = report
        .issues
        .iter()
        .chain(report.warnings.iter())
        .cloned()
        .collect();
    if !findings.is_empty() {
        instructions.push_str("\n\nProblems found:\n");
        instructions.push_str(&bullet_list(&findings));
    }
    instructions.push_str("\n\n");
    instructions.push_str(&hard_constraints());
    with_source(instructions, source)
}

/// `visual_repair`: visual and audio polish only.
pub fn visual_enhancement_prompt(source: &str) -> String {
    let instructions = format!(
        "{persona}\n\n\
         Improve only the visuals and audio of the game below: richer colors, gradients, \
         simple particle or glow effects, smoother animation, and pleasant Web Audio sound \
         effects. Do NOT change game logic, rules, controls, scoring or state handling. \
         Keep drawing on the canvas and keep the {w}x{h} size.",
        persona = PERSONA,
        w = GAME_WIDTH,
        h = GAME_HEIGHT,
    );
    with_source(instructions, source)
}

/// `format_repair`: formatting only.
pub fn formatting_prompt(source: &str) -> String {
    let instructions = format!(
        "{persona}\n\n\
         Reformat the game below with consistent 2-space indentation, consistent spacing and \
         blank lines between logical sections. Do not change any behavior, names or values.",
        persona = PERSONA,
    );
    with_source(instructions, source)
}
