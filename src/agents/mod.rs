//! Stages that turn a topic into a plan, a lesson and a quiz.
//!
//! - [`planner`] - [`PlanStage`], topic and difficulty to [`StudyPlan`]
//! - [`lesson`] - [`LessonStage`], plan to [`Lesson`], with tool calls
//! - [`evaluator`] - [`QuizStage`], lesson to [`Quiz`]
//!
//! Every stage holds one [`ContentBackend`] chosen when the pipeline is
//! built, so the online/offline decision is never re-made per call.

pub mod backend;
pub mod error;
pub mod evaluator;
pub mod lesson;
pub mod offline;
pub mod planner;
pub mod types;

pub use backend::{parse_structured, Artifact, ContentBackend, RemoteBackend};
pub use error::{StageError, StageName, StageResult};
pub use evaluator::{quiz_schema, QuizStage, DEFAULT_QUIZ_QUESTIONS};
pub use lesson::{LessonStage, DEFAULT_MAX_TOOL_TURNS};
pub use offline::{canonical_content, fallback_content, OfflineContentProvider};
pub use planner::{plan_schema, PlanStage};
pub use types::{
    ArtifactError, Difficulty, InvalidDifficulty, Lesson, Quiz, QuizQuestion, StudyPlan,
    VALID_DIFFICULTIES,
};
