//! Prompts for the three generation stages.
//!
//! Each stage sends one fixed system prompt plus a user prompt built from
//! its input artifact. The builders here are the only place prompt text is
//! assembled.

use crate::agents::types::{Difficulty, Lesson, StudyPlan};
use crate::llm::SEARCH_TOOL_NAME;

/// System and user prompt for one stage request.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePrompt {
    /// System prompt establishing the stage's role.
    pub system: String,
    /// User prompt carrying the stage input.
    pub user: String,
}

impl StagePrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// System prompt for the plan stage.
pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are the Planner Agent. Your task is to create a structured study plan as a JSON object.

Respond with a single JSON object containing:
- "topic_to_teach": the topic, as given
- "difficulty_level": one of "Beginner", "Intermediate", "Advanced"
- "key_concepts": an ordered list of 3 to 6 concepts, from foundational to advanced
- "learning_goal": one sentence describing what the learner will be able to do"#;

/// System prompt for the lesson stage.
pub const LESSON_SYSTEM_PROMPT: &str = r####"You are the Teacher Agent. Your task is to take the provided study plan (JSON) and teach the subject in an engaging, detailed lesson.

Write one markdown section per key concept, in the order given, headed "### <n>. <concept>" with n starting at 1.
Use the search tool to fetch current information when it helps."####;

/// System prompt for the quiz stage.
pub const EVALUATOR_SYSTEM_PROMPT: &str = r#"You are the Evaluator Agent. Your task is to write a multiple-choice quiz that checks understanding of the provided lesson.

Respond with a single JSON object containing:
- "quiz_title": a short title
- "questions": a list of questions, each with
  - "question_number": integer, starting at 1, unique
  - "question_text": the question
  - "options": distinct answer options
  - "correct_answer": copied exactly from "options"
  - "explanation": one sentence on why the answer is correct"#;

/// Prompt asking for a study plan.
pub fn build_plan_prompt(topic: &str, difficulty: Difficulty) -> StagePrompt {
    StagePrompt::new(
        PLANNER_SYSTEM_PROMPT,
        format!(
            "Create a study plan for the topic: '{}' at a '{}' difficulty level.",
            topic, difficulty
        ),
    )
}

/// Prompt asking for a lesson that covers `plan`.
///
/// The plan travels as its JSON wire form.
pub fn build_lesson_prompt(plan: &StudyPlan, plan_json: &str) -> StagePrompt {
    let concepts = plan
        .key_concepts
        .iter()
        .enumerate()
        .map(|(i, concept)| format!("{}. {}", i + 1, concept))
        .collect::<Vec<_>>()
        .join("\n");

    StagePrompt::new(
        LESSON_SYSTEM_PROMPT,
        format!(
            "Study plan:\n{}\n\nTeach these concepts at the {} level, one section each:\n{}\n\n\
             The `{}` tool takes a single `query` string.",
            plan_json, plan.difficulty, concepts, SEARCH_TOOL_NAME
        ),
    )
}

/// Prompt asking for a quiz of `question_count` questions on `lesson`.
pub fn build_quiz_prompt(lesson: &Lesson, question_count: usize) -> StagePrompt {
    StagePrompt::new(
        EVALUATOR_SYSTEM_PROMPT,
        format!(
            "Write exactly {} questions about this lesson on {}.\n\nLESSON:\n{}",
            question_count, lesson.topic, lesson.content
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> StudyPlan {
        StudyPlan {
            topic: "Merkle Trees".to_string(),
            difficulty: Difficulty::Intermediate,
            key_concepts: vec!["Hashing".to_string(), "Proofs".to_string()],
            learning_goal: "goal".to_string(),
        }
    }

    #[test]
    fn test_plan_prompt_names_topic_and_difficulty() {
        let prompt = build_plan_prompt("Merkle Trees", Difficulty::Beginner);
        assert_eq!(prompt.system, PLANNER_SYSTEM_PROMPT);
        assert!(prompt.user.contains("'Merkle Trees'"));
        assert!(prompt.user.contains("'Beginner'"));
    }

    #[test]
    fn test_lesson_prompt_lists_concepts_in_order() {
        let plan = plan();
        let prompt = build_lesson_prompt(&plan, "{\"topic_to_teach\":\"Merkle Trees\"}");

        let hashing = prompt.user.find("1. Hashing").expect("first concept");
        let proofs = prompt.user.find("2. Proofs").expect("second concept");
        assert!(hashing < proofs);
        assert!(prompt.user.contains("topic_to_teach"));
        assert!(prompt.user.contains(SEARCH_TOOL_NAME));
    }

    #[test]
    fn test_lesson_system_prompt_keeps_section_heading_format() {
        assert!(LESSON_SYSTEM_PROMPT
            .contains(r####"headed "### <n>. <concept>" with n starting at 1"####));
        assert!(LESSON_SYSTEM_PROMPT.ends_with("when it helps."));
    }

    #[test]
    fn test_quiz_prompt_carries_lesson_text() {
        let lesson = Lesson::new(&plan(), "### 1. Hashing\n\nHashes are one-way.");
        let prompt = build_quiz_prompt(&lesson, 5);
        assert_eq!(prompt.system, EVALUATOR_SYSTEM_PROMPT);
        assert!(prompt.user.contains("exactly 5 questions"));
        assert!(prompt.user.contains("Hashes are one-way."));
    }
}
