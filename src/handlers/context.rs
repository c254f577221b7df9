// src/handlers/context.rs

//! Context ingestion for either flow: docx upload, image upload or camera
//! capture, the crop step and OCR.
//!
//! The session lock is never held across an await: each handler checks and
//! marks the session, hands the slow step to its own task, and that task
//! applies the outcome.

use std::fmt::Display;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    ingest::{CameraError, CropRect, Ingestion, IngestionError, OcrProgress},
    models::session::Session,
    store::{SessionStore, SharedSession},
    utils::data_url::DataUrl,
};

use super::{find_session, run_detached, snapshot};

const READING_DOCX: &str = "Đang đọc tệp .docx...";
const CROPPING: &str = "Đang cắt ảnh...";
const OPENING_CAMERA: &str = "Đang mở camera...";

#[derive(Debug, Deserialize)]
pub struct ImageUpload {
    /// Image as a data URL.
    pub image: String,
}

/// Applies the outcome of a slow step to the session. Failures are kept on
/// the session for inline display and returned to the caller.
fn settle<T, E>(
    shared: &SharedSession,
    outcome: Result<T, E>,
    apply: impl FnOnce(&mut Session, T) -> Result<(), AppError>,
) -> Result<Response, AppError>
where
    E: Display + Into<AppError>,
{
    let mut session = shared.lock();
    session.finish_processing();
    match outcome {
        Ok(value) => apply(&mut session, value)?,
        Err(e) => {
            session.record_error(e.to_string());
            return Err(e.into());
        }
    }
    Ok(snapshot(&session))
}

/// Replaces the context with the text of an uploaded `.docx` (raw body).
pub async fn upload_docx(
    State(sessions): State<SessionStore>,
    State(ingestion): State<Ingestion>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, AppError> {
    let shared = find_session(&sessions, id)?;
    shared.lock().begin_processing(READING_DOCX)?;

    run_detached(async move {
        let outcome = ingestion.documents.extract_text(body.to_vec()).await;

        settle(&shared, outcome, |session, text| {
            session.draft_mut().replace_context(text);
            Ok(())
        })
    })
    .await
}

/// Puts an uploaded image in front of the crop step.
pub async fn upload_image(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<ImageUpload>,
) -> Result<Response, AppError> {
    let shared = find_session(&sessions, id)?;
    let mut session = shared.lock();

    let image = match DataUrl::parse(&req.image) {
        Ok(image) if image.is_image() => image,
        Ok(image) => return Err(reject_image(&mut session, format!("unsupported type {}", image.mime))),
        Err(e) => return Err(reject_image(&mut session, e)),
    };

    session.stage_image(image.to_string())?;
    Ok(snapshot(&session))
}

fn reject_image(session: &mut Session, reason: impl Display) -> AppError {
    let err = IngestionError::image(reason);
    tracing::warn!(session = %session.id(), "Rejected image upload: {}", err.reason());
    session.record_error(err.to_string());
    err.into()
}

/// Crops the staged image, recognizes its text and appends it to the context.
pub async fn confirm_crop(
    State(sessions): State<SessionStore>,
    State(ingestion): State<Ingestion>,
    Path(id): Path<Uuid>,
    Json(rect): Json<CropRect>,
) -> Result<Response, AppError> {
    rect.validate()?;
    let shared = find_session(&sessions, id)?;
    let image = shared.lock().begin_crop(CROPPING)?;

    run_detached(async move {
        let outcome = crop_and_recognize(&ingestion, &shared, &image, rect).await;

        settle(&shared, outcome, |session, text| {
            session.draft_mut().append_context(&text);
            Ok(())
        })
    })
    .await
}

async fn crop_and_recognize(
    ingestion: &Ingestion,
    shared: &SharedSession,
    image: &str,
    rect: CropRect,
) -> Result<String, IngestionError> {
    let image = DataUrl::parse(image).map_err(IngestionError::image)?;
    let cropped = ingestion.cropper.crop(&image, rect).await?;

    let report = |progress: OcrProgress| shared.lock().set_processing_status(progress.label());
    ingestion.recognizer.recognize(&cropped, &report).await
}

/// Leaves the crop step without running OCR.
pub async fn cancel_crop(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_session(&sessions, id)?;
    let mut session = shared.lock();
    session.cancel_crop()?;
    Ok(snapshot(&session))
}

/// Enters camera mode by acquiring the video device. The session counts as
/// processing until the device answers, so a second open is refused.
pub async fn open_camera(
    State(sessions): State<SessionStore>,
    State(ingestion): State<Ingestion>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_session(&sessions, id)?;
    shared.lock().begin_camera_open(OPENING_CAMERA)?;

    run_detached(async move {
        let outcome = ingestion.camera.open().await;

        let mut session = shared.lock();
        match outcome {
            Ok(stream) => session.attach_camera(stream),
            Err(e) => {
                session.finish_processing();
                session.record_error(e.to_string());
                return Err(e.into());
            }
        }
        Ok(snapshot(&session))
    })
    .await
}

/// Leaves camera mode, releasing the device.
pub async fn close_camera(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_session(&sessions, id)?;
    let mut session = shared.lock();
    if session.draft_mut().release_camera() {
        tracing::info!(session = %id, "Camera closed");
    }
    Ok(snapshot(&session))
}

/// Grabs one frame, releases the camera and moves the frame to the crop step.
pub async fn capture_frame(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let shared = find_session(&sessions, id)?;
    let mut stream = shared.lock().take_camera()?;

    run_detached(async move {
        let outcome: Result<DataUrl, CameraError> = stream.capture_frame().await;
        drop(stream);

        let mut session = shared.lock();
        match outcome {
            Ok(frame) => session.stage_image(frame.to_string())?,
            Err(e) => {
                session.record_error(e.to_string());
                return Err(e.into());
            }
        }
        Ok(snapshot(&session))
    })
    .await
}
