// src/handlers/student.rs

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    ai::AiGateway,
    config::Config,
    error::AppError,
    models::{
        question::QuestionType,
        session::Session,
        student::{StudentSession, StudentSetupUpdate},
    },
    store::{SessionStore, SharedSession},
};

use super::{find_session, run_detached, session_not_found, snapshot};

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

fn student(session: &mut Session) -> Result<&mut StudentSession, AppError> {
    session.as_student_mut().ok_or_else(session_not_found)
}

fn find_student(sessions: &SessionStore, id: Uuid) -> Result<SharedSession, AppError> {
    let shared = find_session(sessions, id)?;
    if !matches!(&*shared.lock(), Session::Student(_)) {
        return Err(session_not_found());
    }
    Ok(shared)
}

/// Opens a student session in the setup state.
pub async fn create_session(
    State(sessions): State<SessionStore>,
    State(config): State<Config>,
) -> Response {
    let session = StudentSession::new(Uuid::new_v4(), config.short_answer_pass_score);
    let shared = sessions.insert(Session::Student(session));
    let session = shared.lock();
    tracing::info!(session = %session.id(), "Student session opened");
    (StatusCode::CREATED, snapshot(&session)).into_response()
}

pub async fn get_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let session = shared.lock();
    Ok(snapshot(&session))
}

/// Updates setup fields. Only allowed before the test starts.
pub async fn update_setup(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<StudentSetupUpdate>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let mut session = shared.lock();
    student(&mut session)?.apply_setup(req)?;
    Ok(snapshot(&session))
}

pub async fn delete_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shared = find_student(&sessions, id)?;
    sessions.remove(id);
    shared.lock().draft_mut().release_camera();
    Ok(StatusCode::NO_CONTENT)
}

/// Selects or deselects a question type. The selection never becomes empty.
pub async fn toggle_question_type(
    State(sessions): State<SessionStore>,
    Path((id, question_type)): Path<(Uuid, String)>,
) -> Result<Response, AppError> {
    let question_type = QuestionType::from_str(&question_type).map_err(AppError::BadRequest)?;
    let shared = find_student(&sessions, id)?;
    let mut session = shared.lock();
    student(&mut session)?.toggle_question_type(question_type)?;
    Ok(snapshot(&session))
}

/// Generates the test and enters the testing state.
///
/// An empty test keeps the session in setup and answers 422.
pub async fn start_test(
    State(sessions): State<SessionStore>,
    State(gateway): State<AiGateway>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let request = {
        let mut session = shared.lock();
        student(&mut session)?.begin_test()?
    };

    run_detached(async move {
        let outcome = gateway.generate_student_test(&request).await;

        let mut session = shared.lock();
        student(&mut session)?.finish_test(outcome)?;
        Ok(snapshot(&session))
    })
    .await
}

pub async fn set_answer(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let mut session = shared.lock();
    student(&mut session)?.select_answer(req.answer)?;
    Ok(snapshot(&session))
}

/// Grades the current answer and reveals the feedback.
pub async fn submit_answer(
    State(sessions): State<SessionStore>,
    State(gateway): State<AiGateway>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let (question, answer) = {
        let mut session = shared.lock();
        student(&mut session)?.begin_submit()?
    };

    run_detached(async move {
        let outcome = gateway.grade_answer(&question, &answer).await;

        let mut session = shared.lock();
        student(&mut session)?.finish_submit(outcome)?;
        Ok(snapshot(&session))
    })
    .await
}

pub async fn next_question(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let mut session = shared.lock();
    student(&mut session)?.advance()?;
    Ok(snapshot(&session))
}

/// Starts over from a blank setup.
pub async fn reset_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let mut session = shared.lock();
    student(&mut session)?.reset()?;
    Ok(snapshot(&session))
}

/// Average score and per-question review of a finished test.
pub async fn get_results(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_student(&sessions, id)?;
    let mut session = shared.lock();
    let summary = student(&mut session)?
        .summary()
        .ok_or_else(|| AppError::Conflict("The test has not finished yet".to_string()))?;
    Ok(Json(summary).into_response())
}
