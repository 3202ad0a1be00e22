//! Plan stage: topic and difficulty in, [`StudyPlan`] out.

use super::backend::ContentBackend;
use super::error::{StageName, StageResult};
use super::types::{Difficulty, StudyPlan};
use crate::llm::{OutputSchema, SchemaField, SchemaType};
use crate::prompts::build_plan_prompt;

/// Response schema the backend is asked to follow for plans.
pub fn plan_schema() -> OutputSchema {
    OutputSchema::new(
        "study_plan",
        vec![
            SchemaField::required("topic_to_teach", SchemaType::String),
            SchemaField::required("difficulty_level", SchemaType::String),
            SchemaField::required("key_concepts", SchemaType::array_of(SchemaType::String)),
            SchemaField::required("learning_goal", SchemaType::String),
        ],
    )
}

/// Produces the study plan.
#[derive(Debug, Clone)]
pub struct PlanStage {
    backend: ContentBackend,
}

impl PlanStage {
    pub fn new(backend: ContentBackend) -> Self {
        Self { backend }
    }

    pub async fn run(&self, topic: &str, difficulty: Difficulty) -> StageResult<StudyPlan> {
        tracing::info!(stage = %StageName::Plan, topic, difficulty = %difficulty, "Formulating study plan");

        let plan: StudyPlan = match &self.backend {
            ContentBackend::Offline(provider) => provider.plan(topic, difficulty),
            ContentBackend::Remote(remote) => {
                remote
                    .generate_structured(
                        StageName::Plan,
                        &build_plan_prompt(topic, difficulty),
                        &plan_schema(),
                    )
                    .await?
            }
        };

        tracing::info!(
            stage = %StageName::Plan,
            concepts = plan.key_concepts.len(),
            "Study plan ready"
        );
        Ok(plan)
    }
}
