// src/ai/mod.rs

//! Gateway to the external generative model.
//!
//! Each operation builds a prompt and a response schema, performs exactly one
//! model call and parses the structured reply. There is no retry: a failure is
//! logged and surfaces as a single error carrying a fixed user-facing message.

pub mod gemini;
pub mod prompts;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::messages,
    models::{
        feedback::Feedback,
        question::{Question, QuestionType},
    },
};

/// Failure talking to the model itself.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request to model failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response contained no text")]
    EmptyResponse,
}

/// Why a gateway call failed.
#[derive(Debug, thiserror::Error)]
pub enum GatewayFailure {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("malformed model response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors reported to callers of the gateway. The message is fixed; the
/// cause is available through `source()` and is logged where it happens.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Tạo câu hỏi từ mô hình AI thất bại.")]
    QuestionGeneration(#[source] GatewayFailure),

    #[error("Tạo bài kiểm tra từ mô hình AI thất bại.")]
    TestGeneration(#[source] GatewayFailure),

    #[error("Chấm câu trả lời bằng mô hình AI thất bại.")]
    Grading(#[source] GatewayFailure),

    #[error("{0}")]
    InvalidRequest(String),
}

/// The external model boundary: a prompt plus a response schema in, JSON text out.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherQuestionRequest {
    pub context: String,
    pub num_questions: u8,
    pub cognitive_level: String,
    /// 0 to 10.
    pub difficulty: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentTestRequest {
    pub context: String,
    pub subject: String,
    pub grade: String,
    pub num_questions: u8,
    pub cognitive_level: String,
    pub question_types: Vec<QuestionType>,
}

#[derive(Deserialize)]
struct QuestionEnvelope {
    #[serde(default)]
    questions: Option<Vec<Value>>,
}

#[derive(Clone)]
pub struct AiGateway {
    model: Arc<dyn GenerativeModel>,
}

impl AiGateway {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// A mixed set of questions for a teacher. An empty list is a valid result.
    pub async fn generate_teacher_questions(
        &self,
        request: &TeacherQuestionRequest,
    ) -> Result<Vec<Question>, AiError> {
        check_context(&request.context)?;
        check_count(request.num_questions)?;

        let prompt = prompts::teacher_questions(request);
        let schema = schema::question_list(request.num_questions, true);

        let questions = self.request_questions(&prompt, &schema).await.map_err(|e| {
            tracing::error!("Error generating questions: {}", e);
            AiError::QuestionGeneration(e)
        })?;

        tracing::info!(
            requested = request.num_questions,
            received = questions.len(),
            "Generated teacher questions"
        );
        Ok(questions)
    }

    /// A personalised test. Callers must treat an empty list as "no test".
    pub async fn generate_student_test(
        &self,
        request: &StudentTestRequest,
    ) -> Result<Vec<Question>, AiError> {
        check_context(&request.context)?;
        check_count(request.num_questions)?;
        if request.question_types.is_empty() {
            return Err(AiError::InvalidRequest(messages::QUESTION_TYPE_REQUIRED.to_string()));
        }

        let prompt = prompts::student_test(request);
        let schema = schema::question_list(request.num_questions, false);

        let questions = self.request_questions(&prompt, &schema).await.map_err(|e| {
            tracing::error!("Error generating student test: {}", e);
            AiError::TestGeneration(e)
        })?;

        tracing::info!(
            subject = %request.subject,
            requested = request.num_questions,
            received = questions.len(),
            "Generated student test"
        );
        Ok(questions)
    }

    pub async fn grade_answer(&self, question: &Question, answer: &str) -> Result<Feedback, AiError> {
        let prompt = prompts::grading(question, answer);
        let schema = schema::feedback();

        self.request_feedback(&prompt, &schema).await.map_err(|e| {
            tracing::error!("Error grading answer: {}", e);
            AiError::Grading(e)
        })
    }

    async fn request_feedback(&self, prompt: &str, schema: &Value) -> Result<Feedback, GatewayFailure> {
        let text = self.model.generate_json(prompt, schema).await?;
        Ok(serde_json::from_str(text.trim())?)
    }

    async fn request_questions(&self, prompt: &str, schema: &Value) -> Result<Vec<Question>, GatewayFailure> {
        let text = self.model.generate_json(prompt, schema).await?;
        Ok(parse_questions(&text)?)
    }
}

/// Parses the `{questions: [...]}` envelope. Items that do not deserialize or
/// cannot be brought in line with the question invariants are dropped.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, serde_json::Error> {
    let envelope: QuestionEnvelope = serde_json::from_str(text.trim())?;

    let questions = envelope
        .questions
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match serde_json::from_value::<Question>(raw) {
            Ok(question) => {
                let kind = question.question_type;
                let conformed = question.conform();
                if conformed.is_none() {
                    tracing::warn!("Dropping non-conforming {} question at index {}", kind, index);
                }
                conformed
            }
            Err(e) => {
                tracing::warn!("Dropping unreadable question at index {}: {}", index, e);
                None
            }
        })
        .collect();

    Ok(questions)
}

fn check_context(context: &str) -> Result<(), AiError> {
    if context.trim().is_empty() {
        return Err(AiError::InvalidRequest(messages::CONTEXT_REQUIRED.to_string()));
    }
    Ok(())
}

fn check_count(num_questions: u8) -> Result<(), AiError> {
    if num_questions == 0 {
        return Err(AiError::InvalidRequest(
            "Number of questions must be at least 1".to_string(),
        ));
    }
    Ok(())
}
