// src/handlers/teacher.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    ai::AiGateway,
    error::AppError,
    models::{
        session::Session,
        teacher::{TeacherSession, TeacherUpdate},
    },
    store::{SessionStore, SharedSession},
};

use super::{find_session, run_detached, session_not_found, snapshot};

fn teacher(session: &mut Session) -> Result<&mut TeacherSession, AppError> {
    session.as_teacher_mut().ok_or_else(session_not_found)
}

fn find_teacher(sessions: &SessionStore, id: Uuid) -> Result<SharedSession, AppError> {
    let shared = find_session(sessions, id)?;
    if !matches!(&*shared.lock(), Session::Teacher(_)) {
        return Err(session_not_found());
    }
    Ok(shared)
}

/// Opens a teacher session with the default form values.
pub async fn create_session(State(sessions): State<SessionStore>) -> Response {
    let shared = sessions.insert(Session::Teacher(TeacherSession::new(Uuid::new_v4())));
    let session = shared.lock();
    tracing::info!(session = %session.id(), "Teacher session opened");
    (StatusCode::CREATED, snapshot(&session)).into_response()
}

pub async fn get_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_teacher(&sessions, id)?;
    let session = shared.lock();
    Ok(snapshot(&session))
}

/// Updates the context and generation settings.
pub async fn update_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<TeacherUpdate>,
) -> Result<Response, AppError> {
    let shared = find_teacher(&sessions, id)?;
    let mut session = shared.lock();
    teacher(&mut session)?.apply_update(req)?;
    Ok(snapshot(&session))
}

/// Closes the session and releases its camera, if any.
pub async fn delete_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shared = find_teacher(&sessions, id)?;
    sessions.remove(id);
    shared.lock().draft_mut().release_camera();
    Ok(StatusCode::NO_CONTENT)
}

/// Generates a fresh question set from the current context and settings.
///
/// * Rejects blank context before any model call.
/// * Replaces the previous set; an empty set is a valid result.
pub async fn generate_questions(
    State(sessions): State<SessionStore>,
    State(gateway): State<AiGateway>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_teacher(&sessions, id)?;
    let request = {
        let mut session = shared.lock();
        teacher(&mut session)?.begin_generation()?
    };

    run_detached(async move {
        let outcome = gateway.generate_teacher_questions(&request).await;

        let mut session = shared.lock();
        teacher(&mut session)?.finish_generation(outcome)?;
        Ok(snapshot(&session))
    })
    .await
}
