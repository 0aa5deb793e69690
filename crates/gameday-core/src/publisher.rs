//! Artifact publishing: per-day game source, metadata records and the index.
//!
//! Layout under the games directory:
//! - `<date>.js`: the game
//! - `latest.js`: copy of the most recently published game
//! - `<date>.meta.json`: [`GameMetadata`] as pretty JSON
//! - `<date>.meta.md`: the same record rendered as Markdown
//! - `index.json`: sorted array of every `<date>` with a game file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{DependencyReport, Result, ScoreReport};
use crate::llm::TokenUsage;
use crate::obs::emit_artifact_published;
use crate::pipeline::{CheckRecord, PipelineOutcome, StagesExecuted};

pub const LATEST_FILE: &str = "latest.js";
pub const INDEX_FILE: &str = "index.json";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persisted record describing how a game was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub model: String,
    pub theme: String,
    pub prompt: String,
    pub token_usage: BTreeMap<String, TokenUsage>,
    pub total_tokens: u64,
    pub service_calls: u32,
    pub output_bytes: usize,
    pub source_sha256: String,
    pub functionality: ScoreReport,
    pub dependencies: DependencyReport,
    pub check_history: Vec<CheckRecord>,
    pub stages: StagesExecuted,
    pub duration_ms: u64,
}

/// A game ready to publish.
///
/// Only constructible from a [`PipelineOutcome`], so the stored reports always
/// belong to the stored source.
#[derive(Debug, Clone, PartialEq)]
pub struct GameArtifact {
    date: NaiveDate,
    source: String,
    metadata: GameMetadata,
}

impl GameArtifact {
    pub fn from_outcome(date: NaiveDate, outcome: PipelineOutcome) -> Self {
        Self::from_outcome_at(date, outcome, Utc::now())
    }

    pub fn from_outcome_at(
        date: NaiveDate,
        outcome: PipelineOutcome,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let total_tokens = outcome.total_usage().total_tokens;
        let metadata = GameMetadata {
            date,
            generated_at,
            run_id: outcome.run_id,
            model: outcome.model,
            theme: outcome.theme,
            prompt: outcome.prompt,
            token_usage: outcome.token_usage,
            total_tokens,
            service_calls: outcome.service_calls,
            output_bytes: outcome.source.len(),
            source_sha256: source_digest(&outcome.source),
            functionality: outcome.functionality,
            dependencies: outcome.dependencies,
            check_history: outcome.history,
            stages: outcome.stages,
            duration_ms: outcome.duration_ms,
        };
        Self {
            date,
            source: outcome.source,
            metadata,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn metadata(&self) -> &GameMetadata {
        &self.metadata
    }
}

/// Files written by one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPaths {
    pub source: PathBuf,
    pub latest: PathBuf,
    pub metadata_json: PathBuf,
    pub metadata_md: PathBuf,
    pub index: PathBuf,
}

/// SHA-256 hex digest of a game source.
pub fn source_digest(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parse `YYYY-MM-DD.js` into its date. Anything else (including
/// `latest.js` and metadata files) yields `None`.
pub fn parse_game_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(".js")?;
    if stem.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

/// Every day-keyed game file in `dir`, sorted by date.
pub fn list_game_files(dir: &Path) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let mut games = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        if let Some(date) = name.to_str().and_then(parse_game_file_name) {
            games.push((date, entry.path()));
        }
    }
    games.sort_by_key(|(date, _)| *date);
    Ok(games)
}

/// Writes artifacts into a games directory.
#[derive(Debug, Clone)]
pub struct ArtifactPublisher {
    games_dir: PathBuf,
}

impl ArtifactPublisher {
    pub fn new(games_dir: impl Into<PathBuf>) -> Self {
        Self {
            games_dir: games_dir.into(),
        }
    }

    pub fn games_dir(&self) -> &Path {
        &self.games_dir
    }

    /// Contents of `latest.js`, if a game has been published before.
    pub fn read_latest(&self) -> Result<Option<String>> {
        let path = self.games_dir.join(LATEST_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the game, `latest.js`, both metadata records, then refresh the
    /// index. Re-publishing the same date overwrites that day's files.
    pub fn publish(&self, artifact: &GameArtifact) -> Result<PublishedPaths> {
        std::fs::create_dir_all(&self.games_dir)?;
        let key = artifact.date_key();

        let source = self.games_dir.join(format!("{}.js", key));
        let latest = self.games_dir.join(LATEST_FILE);
        let metadata_json = self.games_dir.join(format!("{}.meta.json", key));
        let metadata_md = self.games_dir.join(format!("{}.meta.md", key));

        std::fs::write(&source, artifact.source())?;
        std::fs::copy(&source, &latest)?;
        std::fs::write(
            &metadata_json,
            serde_json::to_vec_pretty(artifact.metadata())?,
        )?;
        std::fs::write(&metadata_md, render_metadata_md(artifact.metadata()))?;
        self.rebuild_index()?;

        emit_artifact_published(&key, &source, artifact.source().len());

        Ok(PublishedPaths {
            source,
            latest,
            metadata_json,
            metadata_md,
            index: self.games_dir.join(INDEX_FILE),
        })
    }

    /// Rewrite `index.json` from the game files present on disk.
    pub fn rebuild_index(&self) -> Result<Vec<String>> {
        std::fs::create_dir_all(&self.games_dir)?;
        let dates: Vec<String> = list_game_files(&self.games_dir)?
            .into_iter()
            .map(|(date, _)| date.format(DATE_FORMAT).to_string())
            .collect();
        std::fs::write(
            self.games_dir.join(INDEX_FILE),
            serde_json::to_string_pretty(&dates)?,
        )?;
        Ok(dates)
    }

    /// Read back a day's JSON metadata.
    pub fn read_metadata(&self, date: NaiveDate) -> Result<GameMetadata> {
        let path = self
            .games_dir
            .join(format!("{}.meta.json", date.format(DATE_FORMAT)));
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn push_findings(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push_str(&format!("\n### {}\n\n", heading));
    for item in items {
        md.push_str(&format!("- {}\n", item));
    }
}

/// Render the human-readable metadata record.
pub fn render_metadata_md(meta: &GameMetadata) -> String {
    let mut md = format!("# Game of the Day: {}\n\n", meta.date.format(DATE_FORMAT));
    md.push_str(&format!("- **Theme:** {}\n", meta.theme));
    md.push_str(&format!("- **Model:** {}\n", meta.model));
    md.push_str(&format!("- **Generated:** {}\n", meta.generated_at.to_rfc3339()));
    md.push_str(&format!("- **Run ID:** {}\n", meta.run_id));
    md.push_str(&format!("- **Size:** {} bytes\n", meta.output_bytes));
    md.push_str(&format!("- **SHA-256:** `{}`\n", meta.source_sha256));

    let f = &meta.functionality;
    md.push_str("\n## Functionality\n\n");
    md.push_str(&format!(
        "- Score: {}/{} ({:.1}%) {}\n",
        f.score,
        f.max_score,
        f.percentage,
        if f.passing { "PASS" } else { "FAIL" }
    ));
    push_findings(&mut md, "Issues", &f.issues);
    push_findings(&mut md, "Warnings", &f.warnings);

    let d = &meta.dependencies;
    md.push_str("\n## External Dependencies\n\n");
    md.push_str(&format!(
        "- External resources: {}\n- Canvas drawing methods: {}\n",
        if d.has_external_deps { "detected" } else { "none" },
        d.canvas_method_count
    ));
    push_findings(&mut md, "Issues", &d.issues);
    push_findings(&mut md, "Warnings", &d.warnings);

    md.push_str("\n## Pipeline\n\n");
    md.push_str(&format!(
        "- Dependency repair: {}\n- Functionality repair: {}\n- Visual enhancement: {}\n- Formatting: {}\n- Service calls: {}\n- Duration: {}ms\n",
        yes_no(meta.stages.dependency_repair),
        yes_no(meta.stages.functionality_repair),
        yes_no(meta.stages.visual_enhancement),
        yes_no(meta.stages.formatting),
        meta.service_calls,
        meta.duration_ms
    ));

    md.push_str("\n## Token Usage\n\n");
    md.push_str("| Stage | Input | Output | Total |\n|---|---|---|---|\n");
    for (stage, usage) in &meta.token_usage {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            stage, usage.input_tokens, usage.output_tokens, usage.total_tokens
        ));
    }
    md.push_str(&format!("| **total** | | | {} |\n", meta.total_tokens));

    md.push_str("\n## Prompt\n\n```text\n");
    md.push_str(&meta.prompt);
    md.push_str("\n```\n");
    md
}
