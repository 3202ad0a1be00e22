//! Pipeline orchestration for a study session.
//!
//! # Pipeline Flow
//!
//! 1. **Configuration**: [`PipelineConfig::from_env`] reads the environment
//!    once and fixes the [`Mode`] for the whole run
//! 2. **Plan**: topic and difficulty become a study plan
//! 3. **Lesson**: the plan becomes a lesson, one section per key concept
//! 4. **Quiz**: the lesson becomes a multiple-choice quiz
//! 5. **Grading**: collected answers are graded into a report
//!
//! A stage only runs once its predecessor produced a valid artifact.
//!
//! # Example
//!
//! ```rust,ignore
//! use study_streamliner::agents::Difficulty;
//! use study_streamliner::pipeline::{NoopObserver, PipelineConfig, PipelineOrchestrator};
//! use study_streamliner::quiz::TerminalQuiz;
//!
//! let config = PipelineConfig::from_env()?;
//! let orchestrator = PipelineOrchestrator::from_config(&config)?;
//! let report = orchestrator
//!     .run("Merkle Trees", Difficulty::Beginner, &mut NoopObserver, &mut TerminalQuiz::stdio())
//!     .await?;
//! println!("Score: {}", report.score);
//! ```

pub mod config;
pub mod orchestrator;

pub use config::{ConfigError, Mode, PipelineConfig, API_KEY_ENV, MAX_QUIZ_QUESTIONS};
pub use orchestrator::{
    NoopObserver, PipelineError, PipelineObserver, PipelineOrchestrator, StudyMaterials,
};
