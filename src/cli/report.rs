//! Console output for a study session.
//!
//! Artifacts are printed as each stage completes via [`PipelineObserver`],
//! so the orchestrator never touches the terminal itself.

use std::io::{self, Write};

use crate::agents::{Difficulty, Lesson, Quiz, StageError, StudyPlan};
use crate::pipeline::PipelineObserver;
use crate::quiz::GradeReport;

/// Characters of the lesson shown before the full text.
pub const LESSON_PREVIEW_CHARS: usize = 400;

/// Characters of raw model output shown when a stage fails to parse.
pub const RAW_OUTPUT_PREVIEW_CHARS: usize = 500;

const RULE: &str = "===============================================";

/// Writes session progress and results to a terminal-like sink.
pub struct ConsoleReporter<W: Write> {
    out: W,
    lesson: Option<String>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lesson: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "Failed to write console output");
        }
    }

    pub fn banner(&mut self, topic: &str, difficulty: Difficulty) {
        self.emit(&format!(
            "--- Starting Study Streamliner for: {} ({}) ---",
            topic, difficulty
        ));
    }

    pub fn offline_notice(&mut self) {
        self.emit("\n*** OFFLINE MODE ***");
        self.emit("No GEMINI_API_KEY found: running in offline mode with generic content.");
        self.emit("Set the credential to generate lessons and quizzes with the remote model.");
        self.emit("********************\n");
    }

    pub fn grade_report(&mut self, report: &GradeReport) {
        self.emit("\n*** GRADING & FEEDBACK ***");
        self.emit(&format!("Score: {}", report.score));
        for detail in &report.details {
            self.emit(&format!(
                "\nQuestion {} - Correct: {}",
                detail.question_number,
                if detail.is_correct { "YES" } else { "NO" }
            ));
            self.emit(&format!("  Your answer: {}", detail.your_answer));
            self.emit(&format!("  Correct answer: {}", detail.correct_answer));
            if let Some(explanation) = detail.explanation.as_deref().filter(|e| !e.is_empty()) {
                self.emit(&format!("  Explanation: {}", explanation));
            }
        }
        self.emit(&format!("\n{}\n", RULE));
    }

    /// Explain which stage stopped the run and why.
    pub fn abort(&mut self, err: &StageError) {
        self.emit(&format!(
            "\nStudy session stopped: the {} stage failed.",
            err.stage()
        ));
        self.emit(&format!("Reason: {}", err));
        if let Some(raw) = err.raw_output() {
            let shown: String = raw.chars().take(RAW_OUTPUT_PREVIEW_CHARS).collect();
            let ellipsis = if shown.len() < raw.len() { "..." } else { "" };
            self.emit(&format!("Raw output:\n{}{}", shown, ellipsis));
        }
    }
}

impl<W: Write> PipelineObserver for ConsoleReporter<W> {
    fn on_plan(&mut self, plan: &StudyPlan) {
        match serde_json::to_string_pretty(plan) {
            Ok(json) => {
                self.emit("Plan generated successfully:");
                self.emit(&json);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to render study plan"),
        }
    }

    fn on_lesson(&mut self, lesson: &Lesson) {
        let (preview, truncated) = lesson.preview(LESSON_PREVIEW_CHARS);
        self.emit("\nLesson generated successfully. Content preview:");
        self.emit(&format!("{}{}", preview, if truncated { "..." } else { "" }));
        self.lesson = Some(lesson.content.clone());
    }

    fn on_quiz(&mut self, quiz: &Quiz) {
        self.emit(&format!(
            "\nQuiz generated successfully: {} ({} questions)",
            quiz.title,
            quiz.len()
        ));

        if let Some(lesson) = self.lesson.take() {
            self.emit(&format!("\n\n{}", RULE));
            self.emit("         STUDY STREAMLINER LESSON");
            self.emit(RULE);
            self.emit("\n\n*** LESSON ***");
            self.emit(&lesson);
        }
    }
}
