//! study_streamliner: topic in, study plan, lesson and graded quiz out.
//!
//! Three generation stages run in sequence against a remote generative
//! backend, or against deterministic offline content when no credential is
//! configured. Every remote call goes through one bounded retry policy.

// Core modules
pub mod agents;
pub mod cli;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod quiz;
pub mod utils;

// Re-export commonly used types
pub use agents::{Difficulty, Lesson, Quiz, QuizQuestion, StageError, StudyPlan};
pub use error::LlmError;
pub use pipeline::{PipelineConfig, PipelineError, PipelineOrchestrator};
pub use quiz::{AnswerMap, GradeReport, QuizGradingEngine};
