// src/models/student.rs

//! Student self-test session: setup -> testing -> results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    ai::{AiError, StudentTestRequest},
    config::{DEFAULT_NUM_QUESTIONS, MAX_QUESTIONS, MIN_QUESTIONS},
    error::{FlowError, messages},
    models::{
        draft::ContextDraft,
        feedback::{Feedback, GradedResult, Verdict, average_score},
        question::{Question, QuestionType, QuestionTypeSet, STUDENT_DIFFICULTY_LEVELS},
        session::Pending,
    },
};

/// Test customization chosen during setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSettings {
    pub num_questions: u8,
    pub cognitive_level: String,
    pub question_types: QuestionTypeSet,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            num_questions: DEFAULT_NUM_QUESTIONS,
            cognitive_level: STUDENT_DIFFICULTY_LEVELS[1].to_string(),
            question_types: QuestionTypeSet::default(),
        }
    }
}

/// State of a test in progress. One question is visible at a time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRun {
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub current_answer: String,
    pub current_feedback: Option<Feedback>,
    pub current_verdict: Option<Verdict>,
    pub graded_results: Vec<GradedResult>,
}

impl TestRun {
    fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            current_question_index: 0,
            current_answer: String::new(),
            current_feedback: None,
            current_verdict: None,
            graded_results: Vec::new(),
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.questions.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    #[serde(flatten)]
    pub result: GradedResult,
    pub verdict: Verdict,
}

/// Summary shown once the last question has been graded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub average_score: Option<f64>,
    pub review: Vec<ReviewItem>,
}

impl TestSummary {
    fn new(graded: Vec<GradedResult>, pass_score: f64) -> Self {
        let average_score = average_score(&graded);
        let review = graded
            .into_iter()
            .map(|result| {
                let verdict =
                    Verdict::judge(&result.question, &result.answer, &result.feedback, pass_score);
                ReviewItem { result, verdict }
            })
            .collect();

        Self {
            average_score,
            review,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StudentPhase {
    Setup,
    Testing(TestRun),
    Results(TestSummary),
}

/// Partial update of the setup form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StudentSetupUpdate {
    pub context: Option<String>,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(max = 100))]
    pub grade: Option<String>,
    #[validate(range(min = 1, max = 15))]
    pub num_questions: Option<u8>,
    pub cognitive_level: Option<String>,
    pub question_types: Option<Vec<QuestionType>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSession {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: ContextDraft,
    pub subject: String,
    pub grade: String,
    pub settings: TestSettings,
    pub phase: StudentPhase,
    pub pending: Option<Pending>,
    pub error: Option<String>,
    #[serde(skip)]
    pass_score: f64,
    pub created_at: DateTime<Utc>,
}

impl StudentSession {
    /// `pass_score` drives the free-response "correct" display heuristic.
    pub fn new(id: Uuid, pass_score: f64) -> Self {
        Self {
            id,
            draft: ContextDraft::default(),
            subject: String::new(),
            grade: String::new(),
            settings: TestSettings::default(),
            phase: StudentPhase::Setup,
            pending: None,
            error: None,
            pass_score,
            created_at: Utc::now(),
        }
    }

    pub fn run(&self) -> Option<&TestRun> {
        match &self.phase {
            StudentPhase::Testing(run) => Some(run),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&TestSummary> {
        match &self.phase {
            StudentPhase::Results(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn is_setup(&self) -> bool {
        matches!(self.phase, StudentPhase::Setup)
    }

    pub fn apply_setup(&mut self, update: StudentSetupUpdate) -> Result<(), FlowError> {
        let result = self.try_apply_setup(update);
        self.record(result)
    }

    /// Adds or removes a question type; deselecting the last one is a no-op.
    pub fn toggle_question_type(&mut self, question_type: QuestionType) -> Result<bool, FlowError> {
        let result = self
            .ensure_editable()
            .map(|_| self.settings.question_types.toggle(question_type));
        self.record(result)
    }

    /// Validates the setup and marks generation as in flight.
    pub fn begin_test(&mut self) -> Result<StudentTestRequest, FlowError> {
        let result = self.try_begin_test();
        self.record(result)
    }

    /// Applies the generation outcome. An empty test keeps the session in setup.
    pub fn finish_test(&mut self, outcome: Result<Vec<Question>, AiError>) -> Result<(), FlowError> {
        self.pending = None;
        let result = match outcome {
            Ok(questions) if !questions.is_empty() => {
                tracing::info!(session = %self.id, questions = questions.len(), "Student test started");
                self.phase = StudentPhase::Testing(TestRun::new(questions));
                Ok(())
            }
            Ok(_) => Err(FlowError::EmptyResult),
            Err(e) => Err(FlowError::Ai(e)),
        };
        self.record(result)
    }

    pub fn select_answer(&mut self, answer: String) -> Result<(), FlowError> {
        let result = self.try_select_answer(answer);
        self.record(result)
    }

    /// Hands out the question and answer to grade and marks grading as in flight.
    pub fn begin_submit(&mut self) -> Result<(Question, String), FlowError> {
        let result = self.try_begin_submit();
        self.record(result)
    }

    pub fn finish_submit(&mut self, outcome: Result<Feedback, AiError>) -> Result<(), FlowError> {
        self.pending = None;
        let pass_score = self.pass_score;
        let result = match outcome {
            Ok(feedback) => self.testing_mut().and_then(|run| {
                let question = run
                    .current_question()
                    .cloned()
                    .ok_or_else(|| FlowError::InvalidState("No current question".to_string()))?;
                let answer = run.current_answer.clone();

                run.current_verdict = Some(Verdict::judge(&question, &answer, &feedback, pass_score));
                run.current_feedback = Some(feedback.clone());
                run.graded_results.push(GradedResult {
                    question,
                    answer,
                    feedback,
                });
                Ok(())
            }),
            Err(e) => Err(FlowError::Ai(e)),
        };
        self.record(result)
    }

    /// Moves to the next question, or to the results after the last one.
    pub fn advance(&mut self) -> Result<(), FlowError> {
        let result = self.try_advance();
        self.record(result)
    }

    /// Back to a pristine setup. Only available from the results screen.
    pub fn reset(&mut self) -> Result<(), FlowError> {
        let result = self.ensure_idle().and_then(|_| match self.phase {
            StudentPhase::Results(_) => Ok(()),
            _ => Err(FlowError::InvalidState(
                "The session can only be reset from the results".to_string(),
            )),
        });
        self.record(result)?;

        let created_at = self.created_at;
        *self = Self::new(self.id, self.pass_score);
        self.created_at = created_at;
        Ok(())
    }

    /// Context may only change during setup while nothing else runs.
    pub fn ensure_editable(&self) -> Result<(), FlowError> {
        self.ensure_idle()?;
        if !self.is_setup() {
            return Err(FlowError::InvalidState(
                "Setup can only change before the test starts".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), FlowError> {
        match self.pending {
            Some(_) => Err(FlowError::Busy),
            None => Ok(()),
        }
    }

    fn testing_mut(&mut self) -> Result<&mut TestRun, FlowError> {
        match &mut self.phase {
            StudentPhase::Testing(run) => Ok(run),
            _ => Err(FlowError::InvalidState("No test in progress".to_string())),
        }
    }

    /// Every failed action leaves its message on the session for inline display.
    fn record<T>(&mut self, result: Result<T, FlowError>) -> Result<T, FlowError> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => self.error = Some(e.to_string()),
        }
        result
    }

    fn try_apply_setup(&mut self, update: StudentSetupUpdate) -> Result<(), FlowError> {
        self.ensure_editable()?;
        update
            .validate()
            .map_err(|e| FlowError::Validation(e.to_string()))?;

        if let Some(level) = &update.cognitive_level {
            if !STUDENT_DIFFICULTY_LEVELS.contains(&level.as_str()) {
                return Err(FlowError::Validation(format!("Unknown difficulty level '{}'", level)));
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
        let question_types = match update.question_types {
            Some(types) => Some(
                QuestionTypeSet::from_types(types)
                    .ok_or_else(|| FlowError::Validation(messages::QUESTION_TYPE_REQUIRED.to_string()))?,
            ),
            None => None,
        };

        if let Some(context) = update.context {
            self.draft.replace_context(context);
        }
        if let Some(subject) = update.subject {
            self.subject = subject;
        }
        if let Some(grade) = update.grade {
            self.grade = grade;
        }
        if let Some(count) = update.num_questions {
            self.settings.num_questions = count;
        }
        if let Some(level) = update.cognitive_level {
            self.settings.cognitive_level = level;
        }
        if let Some(types) = question_types {
            self.settings.question_types = types;
        }
        Ok(())
    }

    fn try_begin_test(&mut self) -> Result<StudentTestRequest, FlowError> {
        self.ensure_editable()?;

        let missing = [&self.draft.context, &self.subject, &self.grade]
            .iter()
            .any(|field| field.trim().is_empty());
        if missing {
            return Err(FlowError::Validation(messages::STUDENT_SETUP_REQUIRED.to_string()));
        }
        if self.settings.question_types.is_empty() {
            return Err(FlowError::Validation(messages::QUESTION_TYPE_REQUIRED.to_string()));
        }

        self.pending = Some(Pending::Generating);
        Ok(StudentTestRequest {
            context: self.draft.context.clone(),
            subject: self.subject.clone(),
            grade: self.grade.clone(),
            num_questions: self.settings.num_questions,
            cognitive_level: self.settings.cognitive_level.clone(),
            question_types: self.settings.question_types.as_slice().to_vec(),
        })
    }

    fn try_select_answer(&mut self, answer: String) -> Result<(), FlowError> {
        self.ensure_idle()?;
        let run = self.testing_mut()?;
        if run.current_feedback.is_some() {
            return Err(FlowError::InvalidState("This question was already answered".to_string()));
        }

        let question = run
            .current_question()
            .ok_or_else(|| FlowError::InvalidState("No current question".to_string()))?;
        if question.question_type.is_objective() && !question.options.contains(&answer) {
            return Err(FlowError::Validation(
                "The answer must be one of the question's options".to_string(),
            ));
        }

        run.current_answer = answer;
        Ok(())
    }

    fn try_begin_submit(&mut self) -> Result<(Question, String), FlowError> {
        self.ensure_idle()?;
        let run = self.testing_mut()?;
        if run.current_feedback.is_some() {
            return Err(FlowError::InvalidState("This question was already answered".to_string()));
        }
        if run.current_answer.trim().is_empty() {
            return Err(FlowError::Validation(messages::ANSWER_REQUIRED.to_string()));
        }

        let question = run
            .current_question()
            .cloned()
            .ok_or_else(|| FlowError::InvalidState("No current question".to_string()))?;
        let answer = run.current_answer.clone();

        self.pending = Some(Pending::Grading);
        Ok((question, answer))
    }

    fn try_advance(&mut self) -> Result<(), FlowError> {
        self.ensure_idle()?;
        let pass_score = self.pass_score;
        let run = self.testing_mut()?;
        if run.current_feedback.is_none() {
            return Err(FlowError::InvalidState(
                "Submit an answer before moving on".to_string(),
            ));
        }

        if run.is_last_question() {
            let graded = std::mem::take(&mut run.graded_results);
            tracing::info!(session = %self.id, graded = graded.len(), "Student test finished");
            self.phase = StudentPhase::Results(TestSummary::new(graded, pass_score));
        } else {
            run.current_question_index += 1;
            run.current_answer.clear();
            run.current_feedback = None;
            run.current_verdict = None;
        }
        Ok(())
    }
}
