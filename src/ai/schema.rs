// src/ai/schema.rs

//! Structured-output schemas, in the OpenAPI subset the model accepts.

use serde_json::{Value, json};

/// Shape of a single generated question.
pub fn question_item() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "questionText": {
                "type": "STRING",
                "description": "The question content. Should be formatted with Markdown and LaTeX if necessary."
            },
            "options": {
                "type": "ARRAY",
                "description": "For multiple-choice: an array of possible answers. For true/false: an array with ['Đúng', 'Sai']. For short-answer: an empty array.",
                "items": { "type": "STRING" }
            },
            "correctAnswerIndex": {
                "type": "INTEGER",
                "description": "The 0-based index of the correct answer. For true/false, 0 is 'Đúng', 1 is 'Sai'. For short-answer, should be -1."
            },
            "explanation": {
                "type": "STRING",
                "description": "A detailed explanation for the correct answer."
            },
            "questionType": {
                "type": "STRING",
                "description": "The type of question. Can be 'multiple-choice', 'short-answer', or 'true/false'."
            }
        },
        "required": ["questionText", "options", "correctAnswerIndex", "explanation", "questionType"]
    })
}

/// `{questions: Question[]}`. `exact` asks for exactly `count` items in the description.
pub fn question_list(count: u8, exact: bool) -> Value {
    let description = if exact {
        format!("An array of exactly {} questions.", count)
    } else {
        format!("An array of {} questions.", count)
    };

    json!({
        "type": "OBJECT",
        "properties": {
            "questions": {
                "type": "ARRAY",
                "description": description,
                "items": question_item()
            }
        },
        "required": ["questions"]
    })
}

/// `{score, feedback, suggestions}`.
pub fn feedback() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER", "description": "A score from 0 to 10." },
            "feedback": { "type": "STRING", "description": "Constructive feedback on the student's answer." },
            "suggestions": { "type": "STRING", "description": "Actionable suggestions for improvement." }
        },
        "required": ["score", "feedback", "suggestions"]
    })
}
