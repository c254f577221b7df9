// src/handlers/mod.rs

pub mod context;
pub mod ingest;
pub mod meta;
pub mod student;
pub mod teacher;

use std::future::Future;

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::session::Session,
    store::{SessionStore, SharedSession},
};

pub(crate) fn session_not_found() -> AppError {
    AppError::NotFound("Session not found".to_string())
}

pub(crate) fn find_session(sessions: &SessionStore, id: Uuid) -> Result<SharedSession, AppError> {
    sessions.get(id).ok_or_else(session_not_found)
}

/// Current state of a session as the client renders it.
pub(crate) fn snapshot(session: &Session) -> Response {
    Json(session).into_response()
}

/// Runs the slow part of an action on its own task. It completes and applies
/// its outcome to the session even if the client goes away mid-request.
pub(crate) async fn run_detached<F>(step: F) -> Result<Response, AppError>
where
    F: Future<Output = Result<Response, AppError>> + Send + 'static,
{
    tokio::spawn(step).await.map_err(|e| {
        tracing::error!("Session step aborted: {}", e);
        AppError::InternalServerError(e.to_string())
    })?
}
