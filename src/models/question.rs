// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pedagogical tiers offered to teachers, lowest first.
pub const COGNITIVE_LEVELS: [&str; 6] = [
    "Nhận biết",
    "Thông hiểu",
    "Vận dụng",
    "Phân tích",
    "Đánh giá",
    "Sáng tạo",
];

/// The subset of tiers a student may pick for a self-test.
pub const STUDENT_DIFFICULTY_LEVELS: [&str; 3] = ["Nhận biết", "Thông hiểu", "Vận dụng"];

/// Canonical options of a true/false question: index 0 is "true", 1 is "false".
pub const TRUE_FALSE_OPTIONS: [&str; 2] = ["Đúng", "Sai"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "true/false")]
    TrueFalse,
    #[serde(rename = "short-answer")]
    ShortAnswer,
}

impl QuestionType {
    pub const ALL: [QuestionType; 3] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "true/false",
            QuestionType::ShortAnswer => "short-answer",
        }
    }

    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Trắc nghiệm",
            QuestionType::TrueFalse => "Đúng/Sai",
            QuestionType::ShortAnswer => "Trả lời ngắn",
        }
    }

    /// Objective questions have a single correct option.
    pub fn is_objective(&self) -> bool {
        !matches!(self, QuestionType::ShortAnswer)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    /// Accepts the wire names plus `true-false`, since `/` cannot appear in a path segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" => Ok(QuestionType::MultipleChoice),
            "true/false" | "true-false" => Ok(QuestionType::TrueFalse),
            "short-answer" => Ok(QuestionType::ShortAnswer),
            other => Err(format!("Unknown question type '{}'", other)),
        }
    }
}

/// A generated question.
///
/// Field names follow the JSON contract shared with the generative model and
/// the browser client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// May contain Markdown and LaTeX.
    pub question_text: String,

    /// Empty for short-answer, exactly two entries for true/false.
    #[serde(default)]
    pub options: Vec<String>,

    /// Index into `options`, or -1 for short-answer.
    pub correct_answer_index: i32,

    #[serde(default)]
    pub explanation: String,

    pub question_type: QuestionType,
}

impl Question {
    /// Brings model output in line with the per-type invariants.
    ///
    /// Returns `None` when the question cannot be repaired: a true/false item
    /// whose index is not 0 or 1, or a multiple-choice item whose index does
    /// not point at an option.
    pub fn conform(mut self) -> Option<Self> {
        match self.question_type {
            QuestionType::TrueFalse => {
                if !(0..=1).contains(&self.correct_answer_index) {
                    return None;
                }
                if self.options.len() != 2 {
                    self.options = TRUE_FALSE_OPTIONS.iter().map(|o| o.to_string()).collect();
                }
            }
            QuestionType::ShortAnswer => {
                self.options.clear();
                self.correct_answer_index = -1;
            }
            QuestionType::MultipleChoice => {
                self.correct_option()?;
            }
        }
        Some(self)
    }

    pub fn correct_option(&self) -> Option<&str> {
        usize::try_from(self.correct_answer_index)
            .ok()
            .and_then(|index| self.options.get(index))
            .map(String::as_str)
    }

    /// What a reviewer is shown as the right answer: the correct option for
    /// objective questions, the explanation for free response.
    pub fn expected_answer(&self) -> &str {
        if self.question_type.is_objective() {
            self.correct_option().unwrap_or_default()
        } else {
            &self.explanation
        }
    }
}

/// Non-empty, ordered selection of question types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestionTypeSet(Vec<QuestionType>);

impl Default for QuestionTypeSet {
    fn default() -> Self {
        Self(QuestionType::ALL.to_vec())
    }
}

impl QuestionTypeSet {
    /// Builds a set from a list, dropping duplicates. Returns `None` for an empty list.
    pub fn from_types(types: impl IntoIterator<Item = QuestionType>) -> Option<Self> {
        let mut selected = Vec::new();
        for t in types {
            if !selected.contains(&t) {
                selected.push(t);
            }
        }
        (!selected.is_empty()).then_some(Self(selected))
    }

    /// Adds or removes a type. Removing the last remaining type is a no-op.
    /// Returns whether the selection changed.
    pub fn toggle(&mut self, question_type: QuestionType) -> bool {
        if let Some(pos) = self.0.iter().position(|t| *t == question_type) {
            if self.0.len() == 1 {
                return false;
            }
            self.0.remove(pos);
        } else {
            self.0.push(question_type);
        }
        true
    }

    pub fn contains(&self, question_type: QuestionType) -> bool {
        self.0.contains(&question_type)
    }

    pub fn as_slice(&self) -> &[QuestionType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
