// src/models/teacher.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    ai::{AiError, TeacherQuestionRequest},
    config::{DEFAULT_DIFFICULTY, DEFAULT_NUM_QUESTIONS, MAX_DIFFICULTY, MAX_QUESTIONS, MIN_QUESTIONS},
    error::{FlowError, messages},
    models::{
        draft::ContextDraft,
        question::{COGNITIVE_LEVELS, Question},
    },
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSettings {
    pub num_questions: u8,
    pub cognitive_level: String,
    /// 0 to 10.
    pub difficulty: u8,
}

impl Default for TeacherSettings {
    fn default() -> Self {
        Self {
            num_questions: DEFAULT_NUM_QUESTIONS,
            cognitive_level: COGNITIVE_LEVELS[2].to_string(),
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TeacherPhase {
    Idle,
    Generating,
    Ready { questions: Vec<Question> },
}

/// Partial update of the teacher form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeacherUpdate {
    pub context: Option<String>,
    #[validate(range(min = 1, max = 15))]
    pub num_questions: Option<u8>,
    pub cognitive_level: Option<String>,
    #[validate(range(max = 10))]
    pub difficulty: Option<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSession {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: ContextDraft,
    pub settings: TeacherSettings,
    pub phase: TeacherPhase,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TeacherSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            draft: ContextDraft::default(),
            settings: TeacherSettings::default(),
            phase: TeacherPhase::Idle,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn questions(&self) -> &[Question] {
        match &self.phase {
            TeacherPhase::Ready { questions } => questions,
            _ => &[],
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, TeacherPhase::Generating) || self.draft.processing_status.is_some()
    }

    pub fn ensure_idle(&self) -> Result<(), FlowError> {
        if self.is_busy() {
            return Err(FlowError::Busy);
        }
        Ok(())
    }

    pub fn apply_update(&mut self, update: TeacherUpdate) -> Result<(), FlowError> {
        let result = self.try_apply_update(update);
        self.record(result)
    }

    /// Validates the form, drops the previous question set and marks
    /// generation as in flight.
    pub fn begin_generation(&mut self) -> Result<TeacherQuestionRequest, FlowError> {
        let result = self.ensure_idle().and_then(|_| {
            if self.draft.context.trim().is_empty() {
                return Err(FlowError::Validation(messages::CONTEXT_REQUIRED.to_string()));
            }
            Ok(())
        });
        self.record(result)?;

        self.phase = TeacherPhase::Generating;
        Ok(TeacherQuestionRequest {
            context: self.draft.context.clone(),
            num_questions: self.settings.num_questions,
            cognitive_level: self.settings.cognitive_level.clone(),
            difficulty: self.settings.difficulty,
        })
    }

    /// An empty question set is a valid outcome here.
    pub fn finish_generation(&mut self, outcome: Result<Vec<Question>, AiError>) -> Result<(), FlowError> {
        let result = match outcome {
            Ok(questions) => {
                tracing::info!(session = %self.id, questions = questions.len(), "Teacher questions ready");
                self.phase = TeacherPhase::Ready { questions };
                Ok(())
            }
            Err(e) => {
                self.phase = TeacherPhase::Idle;
                Err(FlowError::Ai(e))
            }
        };
        self.record(result)
    }

    fn record<T>(&mut self, result: Result<T, FlowError>) -> Result<T, FlowError> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => self.error = Some(e.to_string()),
        }
        result
    }

    fn try_apply_update(&mut self, update: TeacherUpdate) -> Result<(), FlowError> {
        self.ensure_idle()?;
        update
            .validate()
            .map_err(|e| FlowError::Validation(e.to_string()))?;

        if let Some(level) = &update.cognitive_level {
            if !COGNITIVE_LEVELS.contains(&level.as_str()) {
                return Err(FlowError::Validation(format!("Unknown cognitive level '{}'", level)));
            }
        }
        if let Some(count) = update.num_questions {
            if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&count) {
                return Err(FlowError::Validation(format!(
                    "Number of questions must be between {} and {}",
                    MIN_QUESTIONS, MAX_QUESTIONS
                )));
            }
        }
        if let Some(difficulty) = update.difficulty {
            if difficulty > MAX_DIFFICULTY {
                return Err(FlowError::Validation(format!(
                    "Difficulty must be between 0 and {}",
                    MAX_DIFFICULTY
                )));
            }
        }

        if let Some(context) = update.context {
            self.draft.replace_context(context);
        }
        if let Some(count) = update.num_questions {
            self.settings.num_questions = count;
        }
        if let Some(level) = update.cognitive_level {
            self.settings.cognitive_level = level;
        }
        if let Some(difficulty) = update.difficulty {
            self.settings.difficulty = difficulty;
        }
        Ok(())
    }
}
