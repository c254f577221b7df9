// src/models/feedback.rs

use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// Grading outcome for one submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// 0 to 10 by contract; not enforced.
    pub score: f64,
    pub feedback: String,
    pub suggestions: String,
}

/// A question, the answer given to it, and the grade it received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedResult {
    pub question: Question,
    pub answer: String,
    pub feedback: Feedback,
}

/// Presentation-only judgement of an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub correct: bool,
    pub expected_answer: String,
}

impl Verdict {
    /// Objective questions compare the answer with the correct option verbatim.
    /// Free response has no exact match, so a score above `pass_score` counts.
    pub fn judge(question: &Question, answer: &str, feedback: &Feedback, pass_score: f64) -> Self {
        let correct = if question.question_type.is_objective() {
            question.correct_option() == Some(answer)
        } else {
            feedback.score > pass_score
        };

        Self {
            correct,
            expected_answer: question.expected_answer().to_string(),
        }
    }
}

/// Mean score over all graded answers, `None` when nothing was graded.
pub fn average_score(results: &[GradedResult]) -> Option<f64> {
    if results.is_empty() {
        return None;
    }
    let total: f64 = results.iter().map(|r| r.feedback.score).sum();
    Some(total / results.len() as f64)
}
