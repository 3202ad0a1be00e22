//! Deterministic, credential-free content for every stage.
//!
//! When no backend credential is present each stage substitutes content
//! from here. Everything is a pure function of the stage input, never
//! touches the network, and always satisfies the artifact invariants.

use super::types::{Difficulty, Lesson, Quiz, QuizQuestion, StudyPlan};

/// Concepts that are not topic-specific in the offline plan.
const GENERIC_CONCEPTS: [&str; 3] = [
    "Core architectural components and mechanisms",
    "Practical cloud computing applications",
    "Security considerations and future directions",
];

/// Canonical lesson bodies keyed by exact concept string.
const CANONICAL_CONTENT: &[(&str, &str)] = &[
    (
        "Introduction to Merkle Trees: Definition and Purpose",
        "A **Merkle Tree**, or hash tree, is a data structure used for secure verification of large datasets. Its primary purpose is to allow quick validation that a piece of data hasn't been tampered with, without checking the entire dataset.",
    ),
    (
        "Merkle Tree Construction: Hashing and Root Generation",
        "Construction is a bottom-up process: individual data blocks (leaves) are hashed, pairs of hashes are concatenated and re-hashed, until a single final hash, the **Merkle Root**, is generated. Any change to a leaf changes the root.",
    ),
    (
        "Data Verification using Merkle Proofs",
        "A **Merkle Proof** includes the data block's hash and a list of sibling hashes (the authentication path). Combining these allows one to independently recalculate the Merkle Root. If the calculated root matches the trusted root, the data is verified.",
    ),
    (
        "Applications in Secure Databases: Distributed Ledgers and Tamper Detection",
        "Merkle Trees are the cornerstone of blockchain technology. They secure all transactions within a block, and the Merkle Root in the block header allows 'light clients' to efficiently verify transactions without downloading the full chain.",
    ),
    (
        "Introduction to Birth of Ai fundamentals",
        "The birth of AI is generally traced back to the **Dartmouth Workshop in 1956**, where the term 'Artificial Intelligence' was first coined. Early pioneers like John McCarthy, Marvin Minsky, and Claude Shannon laid the theoretical foundations for machines that could think, learn, and solve problems.",
    ),
    (
        "Core architectural components and mechanisms",
        "Early AI focused on symbolic logic and problem-solving through **expert systems** and **search algorithms** (like A*). These systems used explicitly programmed knowledge bases and rules, contrasting sharply with modern, data-driven deep learning.",
    ),
    (
        "Practical cloud computing applications",
        "Modern AI is dominant in the cloud, powering services like **Google Cloud AI** and **AWS SageMaker**. Applications include natural language processing (NLP) for customer service, computer vision for security, and large language models (LLMs) for content generation.",
    ),
    (
        "Security considerations and future directions",
        "Security concerns include **data privacy** and **model bias**. Future AI is moving toward more generalized intelligence (AGI) and increasing **autonomy**, requiring robust regulatory frameworks and ethical guardrails.",
    ),
];

/// Canonical lesson body for `concept`, if the table has one.
pub fn canonical_content(concept: &str) -> Option<&'static str> {
    CANONICAL_CONTENT
        .iter()
        .find(|(key, _)| *key == concept)
        .map(|(_, body)| *body)
}

/// Body used for concepts missing from the canonical table.
pub fn fallback_content(concept: &str) -> String {
    format!(
        "Explanation for '{}' is available in the full online mode.",
        concept
    )
}

/// Offline substitute for the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineContentProvider {
    quiz_questions: usize,
}

impl Default for OfflineContentProvider {
    fn default() -> Self {
        Self::new(3)
    }
}

impl OfflineContentProvider {
    /// Provider emitting at most `quiz_questions` questions (at least one).
    pub fn new(quiz_questions: usize) -> Self {
        Self {
            quiz_questions: quiz_questions.max(1),
        }
    }

    /// Four templated key concepts and a templated learning goal.
    pub fn plan(&self, topic: &str, difficulty: Difficulty) -> StudyPlan {
        let mut key_concepts = vec![format!("Introduction to {} fundamentals", topic)];
        key_concepts.extend(GENERIC_CONCEPTS.iter().map(|c| c.to_string()));

        StudyPlan {
            topic: topic.to_string(),
            difficulty,
            key_concepts,
            learning_goal: format!(
                "The user will gain a practical and theoretical understanding of {} at the {} level.",
                topic, difficulty
            ),
        }
    }

    /// One numbered section per key concept, in plan order.
    pub fn lesson(&self, plan: &StudyPlan) -> Lesson {
        let mut lines = vec![
            format!("## OFFLINE LESSON: {}", plan.topic),
            "---".to_string(),
            "This lesson is generated in offline mode (no API credential detected).".to_string(),
            "**NOTE:** Content is static; online mode is required for dynamic lessons.".to_string(),
        ];

        for (i, concept) in plan.key_concepts.iter().enumerate() {
            let body = canonical_content(concept)
                .map(str::to_string)
                .unwrap_or_else(|| fallback_content(concept));
            lines.push(format!("\n### {}. {}\n\n{}", i + 1, concept, body));
        }

        Lesson::new(plan, lines.join("\n"))
    }

    /// Questions asking which concept each lesson section covers.
    pub fn quiz(&self, lesson: &Lesson) -> Quiz {
        let mut concepts: Vec<&str> = Vec::new();
        for concept in &lesson.key_concepts {
            if !concepts.contains(&concept.as_str()) {
                concepts.push(concept);
            }
        }

        let questions = if concepts.is_empty() {
            vec![topic_question(&lesson.topic)]
        } else {
            let options: Vec<String> = concepts.iter().map(|c| c.to_string()).collect();
            concepts
                .iter()
                .take(self.quiz_questions)
                .enumerate()
                .map(|(i, concept)| QuizQuestion {
                    question_number: i as u32 + 1,
                    question_text: format!(
                        "Which key concept does section {} of the {} lesson cover?",
                        i + 1,
                        lesson.topic
                    ),
                    options: options.clone(),
                    correct_answer: concept.to_string(),
                    explanation: Some(format!(
                        "Section {} of the lesson is titled '{}'.",
                        i + 1,
                        concept
                    )),
                })
                .collect()
        };

        Quiz {
            title: format!("{} Review Quiz", lesson.topic),
            questions,
        }
    }
}

fn topic_question(topic: &str) -> QuizQuestion {
    let mut options = vec![topic.to_string()];
    let distractor = "An unrelated topic".to_string();
    if distractor != topic {
        options.push(distractor);
    }

    QuizQuestion {
        question_number: 1,
        question_text: "Which topic did this lesson cover?".to_string(),
        options,
        correct_answer: topic.to_string(),
        explanation: Some(format!("The lesson was about {}.", topic)),
    }
}
