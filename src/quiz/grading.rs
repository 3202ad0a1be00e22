//! Grading of submitted answers against a quiz.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agents::types::Quiz;

/// Submitted option text by question number. Missing numbers are unanswered.
pub type AnswerMap = BTreeMap<u32, String>;

/// Recorded answer for an unanswered question.
pub const NO_ANSWER: &str = "No answer provided";

/// Outcome for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_number: u32,
    pub is_correct: bool,
    pub your_answer: String,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Graded quiz: a `"correct/total"` score plus one result per question in
/// quiz order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub score: String,
    pub details: Vec<QuestionResult>,
}

impl GradeReport {
    pub fn correct_count(&self) -> usize {
        self.details.iter().filter(|d| d.is_correct).count()
    }

    pub fn total(&self) -> usize {
        self.details.len()
    }
}

/// Grades answers by trimmed, case-insensitive equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizGradingEngine;

impl QuizGradingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Grade `answers` against `quiz`. Neither input is modified.
    pub fn grade(&self, quiz: &Quiz, answers: &AnswerMap) -> GradeReport {
        let details: Vec<QuestionResult> = quiz
            .questions
            .iter()
            .map(|question| {
                let (your_answer, is_correct) = match answers.get(&question.question_number) {
                    Some(answer) => (
                        answer.clone(),
                        normalize(answer) == normalize(&question.correct_answer),
                    ),
                    None => (NO_ANSWER.to_string(), false),
                };

                QuestionResult {
                    question_number: question.question_number,
                    is_correct,
                    your_answer,
                    correct_answer: question.correct_answer.clone(),
                    explanation: question.explanation.clone(),
                }
            })
            .collect();

        let correct = details.iter().filter(|d| d.is_correct).count();
        let report = GradeReport {
            score: format!("{}/{}", correct, details.len()),
            details,
        };

        tracing::debug!(score = %report.score, "Quiz graded");
        report
    }
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}
