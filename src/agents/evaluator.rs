//! Quiz stage: [`Lesson`] in, [`Quiz`] out.

use super::backend::ContentBackend;
use super::error::{StageName, StageResult};
use super::types::{Lesson, Quiz};
use crate::llm::{OutputSchema, SchemaField, SchemaType};
use crate::prompts::build_quiz_prompt;

/// Default number of questions requested per quiz.
pub const DEFAULT_QUIZ_QUESTIONS: usize = 3;

/// Response schema the backend is asked to follow for quizzes.
pub fn quiz_schema() -> OutputSchema {
    let question = SchemaType::Object(vec![
        SchemaField::required("question_number", SchemaType::Integer),
        SchemaField::required("question_text", SchemaType::String),
        SchemaField::required("options", SchemaType::array_of(SchemaType::String)),
        SchemaField::required("correct_answer", SchemaType::String),
        SchemaField::optional("explanation", SchemaType::String),
    ]);

    OutputSchema::new(
        "quiz",
        vec![
            SchemaField::required("quiz_title", SchemaType::String),
            SchemaField::required("questions", SchemaType::array_of(question)),
        ],
    )
}

/// Produces the quiz.
#[derive(Debug, Clone)]
pub struct QuizStage {
    backend: ContentBackend,
    question_count: usize,
}

impl QuizStage {
    pub fn new(backend: ContentBackend, question_count: usize) -> Self {
        Self {
            backend,
            question_count: question_count.max(1),
        }
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub async fn run(&self, lesson: Lesson) -> StageResult<Quiz> {
        tracing::info!(
            stage = %StageName::Quiz,
            topic = %lesson.topic,
            questions = self.question_count,
            "Generating quiz"
        );

        let quiz: Quiz = match &self.backend {
            ContentBackend::Offline(provider) => provider.quiz(&lesson),
            ContentBackend::Remote(remote) => {
                remote
                    .generate_structured(
                        StageName::Quiz,
                        &build_quiz_prompt(&lesson, self.question_count),
                        &quiz_schema(),
                    )
                    .await?
            }
        };

        tracing::info!(stage = %StageName::Quiz, questions = quiz.len(), "Quiz ready");
        Ok(quiz)
    }
}
