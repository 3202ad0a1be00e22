//! Error types for pipeline stages.
//!
//! A stage fails either because its remote call ran out of options or
//! because its output could not be read as the stage's artifact. Neither is
//! retried at this level: the remote call already applied the retry policy
//! and a parse failure is not transient.

use std::fmt;
use thiserror::Error;

use crate::llm::RemoteCallError;

/// Identifies one of the three pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Plan,
    Lesson,
    Quiz,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Plan => "plan",
            StageName::Lesson => "lesson",
            StageName::Quiz => "quiz",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while a stage produces its artifact.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage's output is not valid structured data.
    #[error("{stage} stage output could not be parsed: {reason}")]
    SchemaParse {
        stage: StageName,
        reason: String,
        /// Raw backend text, kept for diagnosis.
        raw: String,
    },

    /// The remote call failed terminally.
    #[error("{stage} stage remote call failed: {source}")]
    RemoteCall {
        stage: StageName,
        #[source]
        source: RemoteCallError,
    },

    /// The model kept calling tools without producing an answer.
    #[error("{stage} stage made {turns} tool round trips without a final answer")]
    ToolLoopExhausted { stage: StageName, turns: usize },
}

impl StageError {
    pub fn schema_parse(stage: StageName, reason: impl fmt::Display, raw: impl Into<String>) -> Self {
        StageError::SchemaParse {
            stage,
            reason: reason.to_string(),
            raw: raw.into(),
        }
    }

    pub fn stage(&self) -> StageName {
        match self {
            StageError::SchemaParse { stage, .. }
            | StageError::RemoteCall { stage, .. }
            | StageError::ToolLoopExhausted { stage, .. } => *stage,
        }
    }

    /// Raw output of a parse failure.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            StageError::SchemaParse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// Result type alias for stage operations.
pub type StageResult<T> = Result<T, StageError>;
