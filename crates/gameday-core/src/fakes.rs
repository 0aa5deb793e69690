//! In-memory fakes for the generation service (testing only)
//!
//! [`ScriptedGenerator`] answers prompts from a fixed queue of responses and
//! records every prompt it receives, so tests can assert on call counts and
//! prompt contents without network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{GamedayError, Result};
use crate::llm::{Generation, TextGenerator, TokenUsage};

/// A prompt received by a fake generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
}

/// Replays queued responses in order. Once the queue is empty every further
/// call fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<Generation>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text response with a fixed token usage of 100 in / 50 out.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_generation(Generation {
            text: text.into(),
            usage: TokenUsage::new(100, 50),
        })
    }

    pub fn with_generation(self, generation: Generation) -> Self {
        self.responses.lock().unwrap().push_back(Ok(generation));
        self
    }

    /// Queue a failing call.
    pub fn with_error(self, error: GamedayError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, model: &str, prompt: &str) -> Result<Generation> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            prompt: prompt.to_string(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GamedayError::Transport("script exhausted".to_string())))
    }
}
