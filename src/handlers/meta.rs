// src/handlers/meta.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{
    config::{
        Config, DEFAULT_DIFFICULTY, DEFAULT_NUM_QUESTIONS, MAX_DIFFICULTY, MAX_QUESTIONS,
        MIN_QUESTIONS,
    },
    models::question::{COGNITIVE_LEVELS, QuestionType, STUDENT_DIFFICULTY_LEVELS},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTypeInfo {
    pub value: QuestionType,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub min_questions: u8,
    pub max_questions: u8,
    pub max_difficulty: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub num_questions: u8,
    pub difficulty: u8,
    pub teacher_cognitive_level: &'static str,
    pub student_cognitive_level: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub cognitive_levels: &'static [&'static str],
    pub student_levels: &'static [&'static str],
    pub question_types: Vec<QuestionTypeInfo>,
    pub limits: Limits,
    pub defaults: Defaults,
    pub short_answer_pass_score: f64,
}

/// Option lists and limits the client needs to render both forms.
pub async fn get_meta(State(config): State<Config>) -> impl IntoResponse {
    Json(MetaResponse {
        cognitive_levels: &COGNITIVE_LEVELS,
        student_levels: &STUDENT_DIFFICULTY_LEVELS,
        question_types: QuestionType::ALL
            .iter()
            .map(|t| QuestionTypeInfo {
                value: *t,
                label: t.label(),
            })
            .collect(),
        limits: Limits {
            min_questions: MIN_QUESTIONS,
            max_questions: MAX_QUESTIONS,
            max_difficulty: MAX_DIFFICULTY,
        },
        defaults: Defaults {
            num_questions: DEFAULT_NUM_QUESTIONS,
            difficulty: DEFAULT_DIFFICULTY,
            teacher_cognitive_level: COGNITIVE_LEVELS[2],
            student_cognitive_level: STUDENT_DIFFICULTY_LEVELS[1],
        },
        short_answer_pass_score: config.short_answer_pass_score,
    })
}
