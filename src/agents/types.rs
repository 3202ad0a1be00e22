//! Artifacts passed between pipeline stages.
//!
//! A [`StudyPlan`] feeds the lesson stage, a [`Lesson`] feeds the quiz stage,
//! and a [`Quiz`] is handed to the interactive collaborator and the grader.
//! Field names on the wire follow the JSON the backend is asked to emit.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Accepted difficulty levels, in display form.
pub const VALID_DIFFICULTIES: [&str; 3] = ["Beginner", "Intermediate", "Advanced"];

/// Difficulty level of a study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A difficulty string outside the accepted set.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("'{0}' is not a valid difficulty level. Please choose from: Beginner, Intermediate, Advanced")]
pub struct InvalidDifficulty(pub String);

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = InvalidDifficulty;

    /// Case-insensitive match against the three levels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(InvalidDifficulty(s.to_string())),
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = InvalidDifficulty;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An artifact that parsed as JSON but breaks a structural invariant.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArtifactError {
    #[error("study plan has an empty topic")]
    EmptyTopic,

    #[error("study plan has no key concepts")]
    NoKeyConcepts,

    #[error("lesson text is empty")]
    EmptyLesson,

    #[error("quiz has no questions")]
    NoQuestions,

    #[error("question number {0} appears more than once")]
    DuplicateQuestionNumber(u32),

    #[error("question {0} has no options")]
    NoOptions(u32),

    #[error("question {question} lists option '{option}' more than once")]
    DuplicateOption { question: u32, option: String },

    #[error("question {question}: correct answer '{answer}' is not one of its options")]
    CorrectAnswerNotAnOption { question: u32, answer: String },
}

/// Structured study plan produced by the plan stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    #[serde(rename = "topic_to_teach")]
    pub topic: String,
    #[serde(rename = "difficulty_level")]
    pub difficulty: Difficulty,
    pub key_concepts: Vec<String>,
    pub learning_goal: String,
}

impl StudyPlan {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.topic.trim().is_empty() {
            return Err(ArtifactError::EmptyTopic);
        }
        if self.key_concepts.is_empty() {
            return Err(ArtifactError::NoKeyConcepts);
        }
        Ok(())
    }
}

/// Lesson text, one section per key concept of the plan it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub topic: String,
    pub key_concepts: Vec<String>,
    pub content: String,
}

impl Lesson {
    pub fn new(plan: &StudyPlan, content: impl Into<String>) -> Self {
        Self {
            topic: plan.topic.clone(),
            key_concepts: plan.key_concepts.clone(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.content.trim().is_empty() {
            return Err(ArtifactError::EmptyLesson);
        }
        Ok(())
    }

    /// At most `max_chars` characters of the content, and whether it was cut.
    pub fn preview(&self, max_chars: usize) -> (&str, bool) {
        match self.content.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => (&self.content[..byte_idx], true),
            None => (&self.content, false),
        }
    }
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_number: u32,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let number = self.question_number;
        if self.options.is_empty() {
            return Err(ArtifactError::NoOptions(number));
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(ArtifactError::DuplicateOption {
                    question: number,
                    option: option.clone(),
                });
            }
        }

        if !seen.contains(self.correct_answer.as_str()) {
            return Err(ArtifactError::CorrectAnswerNotAnOption {
                question: number,
                answer: self.correct_answer.clone(),
            });
        }
        Ok(())
    }
}

/// Quiz produced by the quiz stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(rename = "quiz_title")]
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.questions.is_empty() {
            return Err(ArtifactError::NoQuestions);
        }

        let mut numbers = HashSet::new();
        for question in &self.questions {
            if !numbers.insert(question.question_number) {
                return Err(ArtifactError::DuplicateQuestionNumber(
                    question.question_number,
                ));
            }
            question.validate()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(number: u32, options: &[&str], correct: &str) -> QuizQuestion {
        QuizQuestion {
            question_number: number,
            question_text: format!("Question {number}?"),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_answer: correct.to_string(),
            explanation: None,
        }
    }

    #[test]
    fn test_difficulty_parse_is_case_insensitive() {
        assert_eq!("beginner".parse::<Difficulty>(), Ok(Difficulty::Beginner));
        assert_eq!("INTERMEDIATE".parse::<Difficulty>(), Ok(Difficulty::Intermediate));
        assert_eq!(" Advanced ".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert_eq!(
            "expert".parse::<Difficulty>(),
            Err(InvalidDifficulty("expert".to_string()))
        );
    }

    #[test]
    fn test_invalid_difficulty_message_lists_choices() {
        let err = "hard".parse::<Difficulty>().expect_err("invalid");
        let message = err.to_string();
        for level in VALID_DIFFICULTIES {
            assert!(message.contains(level));
        }
    }

    #[test]
    fn test_study_plan_wire_format() {
        let json = r#"{
            "topic_to_teach": "Merkle Trees",
            "difficulty_level": "beginner",
            "key_concepts": ["Hashing", "Proofs"],
            "learning_goal": "Understand Merkle proofs"
        }"#;

        let plan: StudyPlan = serde_json::from_str(json).expect("valid plan");
        assert_eq!(plan.topic, "Merkle Trees");
        assert_eq!(plan.difficulty, Difficulty::Beginner);
        assert!(plan.validate().is_ok());

        let value = serde_json::to_value(&plan).expect("serializable");
        assert_eq!(value["difficulty_level"], "Beginner");
        assert_eq!(value["topic_to_teach"], "Merkle Trees");
    }

    #[test]
    fn test_study_plan_rejects_unknown_difficulty() {
        let json = r#"{"topic_to_teach": "X", "difficulty_level": "Expert",
                       "key_concepts": ["a"], "learning_goal": "g"}"#;
        assert!(serde_json::from_str::<StudyPlan>(json).is_err());
    }

    #[test]
    fn test_study_plan_requires_concepts() {
        let plan = StudyPlan {
            topic: "Merkle Trees".to_string(),
            difficulty: Difficulty::Advanced,
            key_concepts: Vec::new(),
            learning_goal: "goal".to_string(),
        };
        assert_eq!(plan.validate(), Err(ArtifactError::NoKeyConcepts));
    }

    #[test]
    fn test_quiz_validation() {
        let valid = Quiz {
            title: "Hashing".to_string(),
            questions: vec![
                question(1, &["A", "B"], "A"),
                question(2, &["C", "D"], "D"),
            ],
        };
        assert!(valid.validate().is_ok());
        assert_eq!(valid.len(), 2);

        let duplicate_number = Quiz {
            title: "T".to_string(),
            questions: vec![question(1, &["A"], "A"), question(1, &["B"], "B")],
        };
        assert_eq!(
            duplicate_number.validate(),
            Err(ArtifactError::DuplicateQuestionNumber(1))
        );

        let empty = Quiz {
            title: "T".to_string(),
            questions: Vec::new(),
        };
        assert_eq!(empty.validate(), Err(ArtifactError::NoQuestions));
    }

    #[test]
    fn test_question_invariants() {
        assert_eq!(
            question(3, &[], "A").validate(),
            Err(ArtifactError::NoOptions(3))
        );
        assert!(matches!(
            question(3, &["A", "A"], "A").validate(),
            Err(ArtifactError::DuplicateOption { question: 3, .. })
        ));
        // Membership is literal; grading normalizes, validation does not.
        assert!(matches!(
            question(3, &["Merkle Root"], "merkle root").validate(),
            Err(ArtifactError::CorrectAnswerNotAnOption { question: 3, .. })
        ));
    }

    #[test]
    fn test_question_explanation_is_optional_on_the_wire() {
        let json = r#"{"question_number": 1, "question_text": "Q?",
                       "options": ["A", "B"], "correct_answer": "B"}"#;
        let parsed: QuizQuestion = serde_json::from_str(json).expect("valid question");
        assert!(parsed.explanation.is_none());
        let back = serde_json::to_string(&parsed).expect("serializable");
        assert!(!back.contains("explanation"));
    }

    #[test]
    fn test_lesson_preview_respects_char_boundaries() {
        let plan = StudyPlan {
            topic: "Hashing".to_string(),
            difficulty: Difficulty::Beginner,
            key_concepts: vec!["SHA".to_string()],
            learning_goal: "goal".to_string(),
        };
        let lesson = Lesson::new(&plan, "héllo wörld");

        assert_eq!(lesson.preview(5), ("héllo", true));
        assert_eq!(lesson.preview(100), ("héllo wörld", false));
        assert_eq!(lesson.key_concepts, plan.key_concepts);
    }
}
