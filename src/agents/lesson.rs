//! Lesson stage: [`StudyPlan`] in, [`Lesson`] out.
//!
//! Online, the lesson is free-form text and the model may call the tools in
//! the registry before answering. Offline, each concept is looked up in the
//! canonical content table.

use std::sync::Arc;

use super::backend::ContentBackend;
use super::error::{StageError, StageName, StageResult};
use super::types::{Lesson, StudyPlan};
use crate::llm::ToolRegistry;
use crate::prompts::build_lesson_prompt;

/// Default cap on model requests within one lesson.
pub const DEFAULT_MAX_TOOL_TURNS: usize = 4;

/// Produces the lesson.
#[derive(Debug, Clone)]
pub struct LessonStage {
    backend: ContentBackend,
    tools: Arc<ToolRegistry>,
    max_tool_turns: usize,
}

impl LessonStage {
    pub fn new(backend: ContentBackend, tools: Arc<ToolRegistry>, max_tool_turns: usize) -> Self {
        Self {
            backend,
            tools,
            max_tool_turns: max_tool_turns.max(1),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn run(&self, plan: StudyPlan) -> StageResult<Lesson> {
        tracing::info!(
            stage = %StageName::Lesson,
            topic = %plan.topic,
            concepts = plan.key_concepts.len(),
            "Generating lesson"
        );

        let lesson = match &self.backend {
            ContentBackend::Offline(provider) => provider.lesson(&plan),
            ContentBackend::Remote(remote) => {
                let plan_json = serde_json::to_string_pretty(&plan)
                    .map_err(|e| StageError::schema_parse(StageName::Lesson, e, ""))?;
                let text = remote
                    .generate_with_tools(
                        StageName::Lesson,
                        &build_lesson_prompt(&plan, &plan_json),
                        &self.tools,
                        self.max_tool_turns,
                    )
                    .await?;

                let lesson = Lesson::new(&plan, text);
                lesson.validate().map_err(|e| {
                    StageError::schema_parse(StageName::Lesson, e, lesson.content.clone())
                })?;
                lesson
            }
        };

        tracing::info!(
            stage = %StageName::Lesson,
            chars = lesson.content.chars().count(),
            "Lesson ready"
        );
        Ok(lesson)
    }
}
