//! Pipeline configuration.
//!
//! Everything the pipeline needs to know is read from the environment once
//! at startup, validated, and then passed down explicitly. In particular the
//! online/offline [`Mode`] is decided here and never re-checked.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::agents::{DEFAULT_MAX_TOOL_TURNS, DEFAULT_QUIZ_QUESTIONS};
use crate::llm::{
    RetryPolicy, DEFAULT_API_BASE, DEFAULT_ATTEMPTS, DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_JITTER,
    DEFAULT_MODEL,
};

/// Credential variable whose presence selects online mode.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Largest quiz the pipeline will ask for.
pub const MAX_QUIZ_QUESTIONS: usize = 10;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Where stage content comes from for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Remote backend, credential present.
    Online,
    /// Deterministic local content, no credential.
    Offline,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Online => "online",
            Mode::Offline => "offline",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the study pipeline.
#[derive(Clone)]
pub struct PipelineConfig {
    // Backend settings
    /// Backend credential. `None` means offline mode.
    pub api_key: Option<String>,
    /// Base URL of the chat-completions API.
    pub api_base: String,
    /// Model used by every online stage.
    pub model: String,

    // Retry settings
    /// Total attempts per remote call.
    pub retry_attempts: u32,
    /// Backoff base in seconds.
    pub backoff_factor: f64,
    /// Upper bound of the backoff jitter in seconds.
    pub max_jitter: f64,
    /// Budget for one remote call including retries.
    pub call_deadline: Option<Duration>,

    // Stage settings
    /// Questions requested from the quiz stage.
    pub quiz_questions: usize,
    /// Cap on model requests within the lesson tool loop.
    pub max_tool_turns: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),

            retry_attempts: DEFAULT_ATTEMPTS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_jitter: DEFAULT_MAX_JITTER,
            call_deadline: None,

            quiz_questions: DEFAULT_QUIZ_QUESTIONS,
            max_tool_turns: DEFAULT_MAX_TOOL_TURNS,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("mode", &self.mode())
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("retry_attempts", &self.retry_attempts)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_jitter", &self.max_jitter)
            .field("call_deadline", &self.call_deadline)
            .field("quiz_questions", &self.quiz_questions)
            .field("max_tool_turns", &self.max_tool_turns)
            .finish()
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values (offline).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GEMINI_API_KEY`: backend credential; absent or empty selects offline mode
    /// - `STREAMLINER_API_BASE`: chat-completions base URL
    /// - `STREAMLINER_MODEL`: model name (default: gemini-2.5-flash)
    /// - `STREAMLINER_RETRY_ATTEMPTS`: attempts per remote call (default: 3)
    /// - `STREAMLINER_BACKOFF_FACTOR`: backoff base in seconds (default: 1.0)
    /// - `STREAMLINER_MAX_JITTER`: jitter bound in seconds (default: 0.5)
    /// - `STREAMLINER_CALL_DEADLINE_SECS`: per-call budget in seconds (default: none)
    /// - `STREAMLINER_QUIZ_QUESTIONS`: quiz length (default: 3)
    /// - `STREAMLINER_MAX_TOOL_TURNS`: lesson tool loop cap (default: 4)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Backend settings
        config.api_key = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty());

        if let Some(val) = lookup("STREAMLINER_API_BASE") {
            config.api_base = val;
        }

        if let Some(val) = lookup("STREAMLINER_MODEL") {
            config.model = val;
        }

        // Retry settings
        if let Some(val) = lookup("STREAMLINER_RETRY_ATTEMPTS") {
            config.retry_attempts = parse_env_value(&val, "STREAMLINER_RETRY_ATTEMPTS")?;
        }

        if let Some(val) = lookup("STREAMLINER_BACKOFF_FACTOR") {
            config.backoff_factor = parse_env_value(&val, "STREAMLINER_BACKOFF_FACTOR")?;
        }

        if let Some(val) = lookup("STREAMLINER_MAX_JITTER") {
            config.max_jitter = parse_env_value(&val, "STREAMLINER_MAX_JITTER")?;
        }

        if let Some(val) = lookup("STREAMLINER_CALL_DEADLINE_SECS") {
            let secs: u64 = parse_env_value(&val, "STREAMLINER_CALL_DEADLINE_SECS")?;
            config.call_deadline = Some(Duration::from_secs(secs));
        }

        // Stage settings
        if let Some(val) = lookup("STREAMLINER_QUIZ_QUESTIONS") {
            config.quiz_questions = parse_env_value(&val, "STREAMLINER_QUIZ_QUESTIONS")?;
        }

        if let Some(val) = lookup("STREAMLINER_MAX_TOOL_TURNS") {
            config.max_tool_turns = parse_env_value(&val, "STREAMLINER_MAX_TOOL_TURNS")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Online when a credential is present.
    pub fn mode(&self) -> Mode {
        if self.api_key.is_some() {
            Mode::Online
        } else {
            Mode::Offline
        }
    }

    /// Retry policy for every online stage.
    pub fn retry_policy(&self) -> RetryPolicy {
        let policy =
            RetryPolicy::new(self.retry_attempts, self.backoff_factor).with_max_jitter(self.max_jitter);
        match self.call_deadline {
            Some(deadline) => policy.with_deadline(deadline),
            None => policy,
        }
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "api_base cannot be empty".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model cannot be empty".to_string(),
            ));
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "retry_attempts must be at least 1".to_string(),
            ));
        }

        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "backoff_factor must be a non-negative number".to_string(),
            ));
        }

        if !self.max_jitter.is_finite() || self.max_jitter < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "max_jitter must be a non-negative number".to_string(),
            ));
        }

        if self.call_deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ValidationFailed(
                "call_deadline must be greater than 0".to_string(),
            ));
        }

        if !(1..=MAX_QUIZ_QUESTIONS).contains(&self.quiz_questions) {
            return Err(ConfigError::ValidationFailed(format!(
                "quiz_questions must be between 1 and {}",
                MAX_QUIZ_QUESTIONS
            )));
        }

        if self.max_tool_turns == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tool_turns must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the credential. Empty selects offline mode.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    /// Builder method to set the API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Builder method to set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder method to set retry attempts and backoff base.
    pub fn with_retry(mut self, attempts: u32, backoff_factor: f64) -> Self {
        self.retry_attempts = attempts;
        self.backoff_factor = backoff_factor;
        self
    }

    /// Builder method to set the jitter bound.
    pub fn with_max_jitter(mut self, max_jitter: f64) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Builder method to set the per-call deadline.
    pub fn with_call_deadline(mut self, deadline: Duration) -> Self {
        self.call_deadline = Some(deadline);
        self
    }

    /// Builder method to set the quiz length.
    pub fn with_quiz_questions(mut self, count: usize) -> Self {
        self.quiz_questions = count;
        self
    }

    /// Builder method to set the tool loop cap.
    pub fn with_max_tool_turns(mut self, turns: usize) -> Self {
        self.max_tool_turns = turns;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
