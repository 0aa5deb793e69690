//! Run configuration.
//!
//! Model, theme, pass threshold and output directory live in an immutable
//! [`GenerationConfig`] handed to the pipeline at construction. Service
//! credentials live in [`OpenAiConfig`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{GamedayError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_THEME: &str = "open world exploration";
pub const DEFAULT_PASS_THRESHOLD: f64 = 60.0;
pub const DEFAULT_GAMES_DIR: &str = "games";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Settings for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Theme of the day embedded in the generation prompt.
    pub theme: String,
    /// Minimum functionality percentage for a source to count as passing.
    pub pass_threshold: f64,
    /// Directory receiving the published artifacts.
    pub games_dir: PathBuf,
    /// Run the visual/audio enhancement stage.
    pub visual_enhancement: bool,
    /// Run the formatting stage.
    pub formatting: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            theme: DEFAULT_THEME.to_string(),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            games_dir: PathBuf::from(DEFAULT_GAMES_DIR),
            visual_enhancement: true,
            formatting: true,
        }
    }
}

impl GenerationConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_pass_threshold(mut self, threshold: f64) -> Self {
        self.pass_threshold = threshold;
        self
    }

    pub fn with_games_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.games_dir = dir.into();
        self
    }

    /// Skip the visual/audio enhancement stage.
    pub fn without_visual_enhancement(mut self) -> Self {
        self.visual_enhancement = false;
        self
    }

    /// Skip the formatting stage.
    pub fn without_formatting(mut self) -> Self {
        self.formatting = false;
        self
    }

    /// Reject settings the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(GamedayError::InvalidConfig("model must not be empty".into()));
        }
        if self.theme.trim().is_empty() {
            return Err(GamedayError::InvalidConfig("theme must not be empty".into()));
        }
        if !(0.0..=100.0).contains(&self.pass_threshold) {
            return Err(GamedayError::InvalidConfig(format!(
                "pass threshold {} is outside 0..=100",
                self.pass_threshold
            )));
        }
        Ok(())
    }
}

/// Connection settings for the OpenAI Responses API.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OpenAiConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `OPENAI_API_KEY` and the optional `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GamedayError::MissingApiKey)?;
        let config = Self::new(&api_key);
        match std::env::var("OPENAI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Ok(config.with_base_url(url.trim())),
            _ => Ok(config),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}
