// src/handlers/ingest.rs

//! Stateless ingestion helpers: the client posts a file or an image and gets
//! the extracted text back.

use axum::{Json, body::Bytes, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    ingest::{CropRect, Ingestion, IngestionError, OcrProgress},
    utils::data_url::DataUrl,
};

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageTextRequest {
    /// Image as a data URL.
    pub image: String,
    pub crop: Option<CropRect>,
}

/// Extracts the plain text of a `.docx` sent as the raw request body.
pub async fn docx_to_text(
    State(ingestion): State<Ingestion>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let text = ingestion.documents.extract_text(body.to_vec()).await?;
    Ok(Json(TextResponse { text }))
}

/// Optionally crops an image, then runs OCR on it.
pub async fn image_to_text(
    State(ingestion): State<Ingestion>,
    Json(req): Json<ImageTextRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(rect) = &req.crop {
        rect.validate()?;
    }

    let mut image = DataUrl::parse(&req.image).map_err(IngestionError::image)?;
    if let Some(rect) = req.crop {
        image = ingestion.cropper.crop(&image, rect).await?;
    }

    let report = |progress: OcrProgress| tracing::debug!("OCR {}", progress.label());
    let text = ingestion.recognizer.recognize(&image, &report).await?;

    Ok(Json(TextResponse { text }))
}
