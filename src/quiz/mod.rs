//! Multiple-choice quizzes over the ingested material.
//!
//! [`QuizGenerator`] asks the model for structured questions and validates
//! them; [`Quiz::grade`] scores a set of answers.

mod generator;

pub use generator::{parse_quiz, quiz_schema, QuizGenerator};

use crate::config::QuizSettings;
use crate::error::{Result, StudyError};
use serde::{Deserialize, Serialize};

/// Number of answer options per question.
pub const OPTION_COUNT: usize = 4;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl QuizItem {
    /// Check the item shape: four distinct, non-blank options, one of which
    /// is the correct answer.
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(StudyError::Schema("question text is empty".to_string()));
        }
        if self.options.len() != OPTION_COUNT {
            return Err(StudyError::Schema(format!(
                "\"{}\" has {} options, expected {}",
                self.question,
                self.options.len(),
                OPTION_COUNT
            )));
        }
        if self.options.iter().any(|o| o.trim().is_empty()) {
            return Err(StudyError::Schema(format!(
                "\"{}\" has a blank option",
                self.question
            )));
        }
        for (i, option) in self.options.iter().enumerate() {
            if self.options[..i].contains(option) {
                return Err(StudyError::Schema(format!(
                    "\"{}\" repeats the option \"{}\"",
                    self.question, option
                )));
            }
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(StudyError::Schema(format!(
                "the answer to \"{}\" is not among its options",
                self.question
            )));
        }
        Ok(())
    }
}

/// An ordered set of questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub items: Vec<QuizItem>,
}

impl Quiz {
    pub fn new(items: Vec<QuizItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Grade answers given in question order. Missing entries count as
    /// unanswered; extra entries are ignored.
    pub fn grade(&self, answers: &[Option<String>]) -> GradeReport {
        let results: Vec<ItemResult> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let selected = answers.get(i).cloned().flatten();
                let is_correct = selected.as_deref() == Some(item.correct_answer.as_str());
                ItemResult {
                    question: item.question.clone(),
                    selected,
                    correct_answer: item.correct_answer.clone(),
                    is_correct,
                }
            })
            .collect();

        let correct = results.iter().filter(|r| r.is_correct).count();
        let total = results.len();
        let score = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        };

        GradeReport {
            results,
            correct,
            total,
            score,
        }
    }
}

/// Outcome for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub question: String,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Graded submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub results: Vec<ItemResult>,
    pub correct: usize,
    pub total: usize,
    /// Percentage in `[0, 100]`.
    pub score: f64,
}

impl GradeReport {
    /// Score rounded to two decimals, e.g. `"66.67"`.
    pub fn score_display(&self) -> String {
        format!("{:.2}", self.score)
    }

    pub fn passed(&self, pass_score: f64) -> bool {
        self.score >= pass_score
    }

    /// Encouragement shown under the score.
    pub fn verdict(&self, pass_score: f64) -> &'static str {
        if self.passed(pass_score) {
            "Great job! You have a solid grasp of the material."
        } else {
            "Keep going! Review the material and try again."
        }
    }
}

/// How many questions to ask about material of `word_count` words.
pub fn question_count(word_count: usize, settings: &QuizSettings) -> usize {
    let per_question = settings.words_per_question.max(1);
    (word_count / per_question).clamp(settings.min_questions, settings.max_questions)
}
