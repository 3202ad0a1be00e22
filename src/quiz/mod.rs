//! Quiz interaction and grading.
//!
//! [`interactive`] collects answers from the user; [`grading`] scores them.
//! Grading is independent of the pipeline and runs on an already validated
//! quiz.

pub mod grading;
pub mod interactive;

pub use grading::{AnswerMap, GradeReport, QuestionResult, QuizGradingEngine, NO_ANSWER};
pub use interactive::{AnswerCollector, TerminalQuiz};
