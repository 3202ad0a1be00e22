//! Pipeline orchestrator for a study session.
//!
//! Runs plan, lesson and quiz strictly in order, each stage consuming the
//! previous stage's artifact, and stops at the first failure. After the quiz
//! is ready the answer collector is asked for answers and the grading engine
//! produces the report.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::agents::{
    ContentBackend, Difficulty, Lesson, LessonStage, OfflineContentProvider, PlanStage, Quiz,
    QuizStage, RemoteBackend, StageError, StudyPlan,
};
use crate::error::LlmError;
use crate::llm::{CancellationToken, ChatClient, RemoteInvoker, ToolRegistry};
use crate::quiz::{AnswerCollector, GradeReport, QuizGradingEngine};

use super::config::{ConfigError, Mode, PipelineConfig};

/// Errors that can occur during pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The backend client could not be created.
    #[error("Backend client error: {0}")]
    Client(#[from] LlmError),

    /// A stage failed; later stages did not run.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Reading answers from the user failed.
    #[error("Quiz interaction failed: {0}")]
    Interaction(#[from] io::Error),
}

impl PipelineError {
    /// The failed stage, for stage errors.
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            PipelineError::Stage(err) => Some(err),
            _ => None,
        }
    }
}

/// Artifacts of a completed generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyMaterials {
    pub plan: StudyPlan,
    pub lesson: Lesson,
    pub quiz: Quiz,
}

/// Callbacks fired as each stage completes.
pub trait PipelineObserver {
    fn on_plan(&mut self, _plan: &StudyPlan) {}
    fn on_lesson(&mut self, _lesson: &Lesson) {}
    fn on_quiz(&mut self, _quiz: &Quiz) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Sequences the three stages and grades the result.
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    mode: Mode,
    plan_stage: PlanStage,
    lesson_stage: LessonStage,
    quiz_stage: QuizStage,
    grader: QuizGradingEngine,
}

impl PipelineOrchestrator {
    pub fn new(
        mode: Mode,
        plan_stage: PlanStage,
        lesson_stage: LessonStage,
        quiz_stage: QuizStage,
    ) -> Self {
        Self {
            mode,
            plan_stage,
            lesson_stage,
            quiz_stage,
            grader: QuizGradingEngine::new(),
        }
    }

    /// Build all three stages from `config`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` for invalid settings and
    /// `PipelineError::Client` if the backend client cannot be created.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Self::from_config_with_cancellation(config, CancellationToken::new())
    }

    /// Like [`from_config`](Self::from_config), observing `cancellation`
    /// before every remote attempt.
    pub fn from_config_with_cancellation(
        config: &PipelineConfig,
        cancellation: CancellationToken,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let backend = match &config.api_key {
            Some(api_key) => {
                let client = ChatClient::new(&config.api_base, api_key, &config.model)?;
                tracing::info!(
                    api_base = client.api_base(),
                    model = %config.model,
                    api_key = %client.api_key_masked(),
                    "Using remote backend"
                );
                let invoker = RemoteInvoker::new(Arc::new(client), config.retry_policy())
                    .with_cancellation(cancellation);
                ContentBackend::Remote(RemoteBackend::new(Arc::new(invoker), &config.model))
            }
            None => {
                tracing::info!("No credential found, using offline content");
                ContentBackend::Offline(OfflineContentProvider::new(config.quiz_questions))
            }
        };

        Ok(Self::with_backend(config, backend))
    }

    /// Build all three stages around one shared backend.
    pub fn with_backend(config: &PipelineConfig, backend: ContentBackend) -> Self {
        let mode = if backend.is_offline() {
            Mode::Offline
        } else {
            Mode::Online
        };

        Self::new(
            mode,
            PlanStage::new(backend.clone()),
            LessonStage::new(
                backend.clone(),
                Arc::new(ToolRegistry::with_search()),
                config.max_tool_turns,
            ),
            QuizStage::new(backend, config.quiz_questions),
        )
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Produce plan, lesson and quiz. The first stage failure ends the run.
    pub async fn generate(
        &self,
        topic: &str,
        difficulty: Difficulty,
        observer: &mut dyn PipelineObserver,
    ) -> Result<StudyMaterials, PipelineError> {
        tracing::info!(mode = %self.mode, topic, difficulty = %difficulty, "Starting pipeline");

        let plan = self
            .plan_stage
            .run(topic, difficulty)
            .await
            .inspect_err(log_abort)?;
        observer.on_plan(&plan);

        let lesson = self
            .lesson_stage
            .run(plan.clone())
            .await
            .inspect_err(log_abort)?;
        observer.on_lesson(&lesson);

        let quiz = self
            .quiz_stage
            .run(lesson.clone())
            .await
            .inspect_err(log_abort)?;
        observer.on_quiz(&quiz);

        Ok(StudyMaterials { plan, lesson, quiz })
    }

    /// Generate the materials, collect answers and grade them.
    pub async fn run(
        &self,
        topic: &str,
        difficulty: Difficulty,
        observer: &mut dyn PipelineObserver,
        collector: &mut dyn AnswerCollector,
    ) -> Result<GradeReport, PipelineError> {
        let materials = self.generate(topic, difficulty, observer).await?;
        let answers = collector.collect(&materials.quiz)?;
        let report = self.grader.grade(&materials.quiz, &answers);

        tracing::info!(score = %report.score, "Pipeline complete");
        Ok(report)
    }
}

fn log_abort(err: &StageError) {
    tracing::error!(stage = %err.stage(), error = %err, "Pipeline aborted");
}
