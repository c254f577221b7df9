// src/ingest/mod.rs

//! Turning uploaded documents and images into context text.
//!
//! Every capability sits behind a trait so the handlers never reach for a
//! concrete engine; `AppState` carries the implementations.

pub mod camera;
pub mod crop;
pub mod docx;
pub mod ocr;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{config::Config, utils::data_url::DataUrl};

/// Ingestion failures. `Display` is the fixed user-facing message; `reason`
/// carries the technical detail that only goes to the logs.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Không thể đọc tệp .docx.")]
    Document { reason: String },

    #[error("Nhận dạng văn bản thất bại.")]
    Recognition { reason: String },

    #[error("Không thể xử lý ảnh.")]
    Image { reason: String },
}

impl IngestionError {
    pub fn document(reason: impl fmt::Display) -> Self {
        Self::Document { reason: reason.to_string() }
    }

    pub fn recognition(reason: impl fmt::Display) -> Self {
        Self::Recognition { reason: reason.to_string() }
    }

    pub fn image(reason: impl fmt::Display) -> Self {
        Self::Image { reason: reason.to_string() }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Document { reason } | Self::Recognition { reason } | Self::Image { reason } => {
                reason
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("Không thể truy cập camera. Vui lòng cấp quyền.")]
    Denied { reason: String },

    #[error("Chụp ảnh từ camera thất bại.")]
    Capture { reason: String },
}

impl CameraError {
    pub fn reason(&self) -> &str {
        match self {
            Self::Denied { reason } | Self::Capture { reason } => reason,
        }
    }
}

/// A progress event emitted by the OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrProgress {
    pub status: String,
    /// Fraction between 0 and 1, when the engine knows it.
    pub progress: Option<f32>,
}

impl OcrProgress {
    pub fn new(status: impl Into<String>, progress: Option<f32>) -> Self {
        Self {
            status: status.into(),
            progress,
        }
    }

    /// Status line in the form `[status] 42%`.
    pub fn label(&self) -> String {
        match self.progress {
            Some(fraction) => {
                let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
                format!("[{}] {}%", self.status, percent)
            }
            None => format!("[{}]", self.status),
        }
    }
}

/// Pixel rectangle chosen in the crop step. Fractional values from the
/// browser cropper are accepted and rounded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Validate)]
pub struct CropRect {
    #[validate(range(min = 0.0))]
    pub x: f64,
    #[validate(range(min = 0.0))]
    pub y: f64,
    #[validate(range(min = 1.0))]
    pub width: f64,
    #[validate(range(min = 1.0))]
    pub height: f64,
}

impl CropRect {
    /// Intersects the rectangle with an image of the given size. Returns
    /// `(x, y, width, height)` or `None` when nothing is left.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;

        let left = clamp(self.x, image_width);
        let top = clamp(self.y, image_height);
        let right = clamp(self.x + self.width, image_width);
        let bottom = clamp(self.y + self.height, image_height);

        (right > left && bottom > top).then(|| (left, top, right - left, bottom - top))
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Plain text of a `.docx` file given its raw bytes.
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, IngestionError>;
}

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(
        &self,
        image: &DataUrl,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, IngestionError>;
}

#[async_trait]
pub trait ImageCropper: Send + Sync {
    async fn crop(&self, image: &DataUrl, rect: CropRect) -> Result<DataUrl, IngestionError>;
}

#[async_trait]
pub trait Camera: Send + Sync {
    /// Acquires a live stream. The stream is released when dropped.
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError>;
}

#[async_trait]
pub trait CameraStream: Send + fmt::Debug {
    /// Grabs a single frame as an image data URL.
    async fn capture_frame(&mut self) -> Result<DataUrl, CameraError>;
}

/// The ingestion capabilities injected into the handlers.
#[derive(Clone)]
pub struct Ingestion {
    pub documents: Arc<dyn DocumentExtractor>,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub cropper: Arc<dyn ImageCropper>,
    pub camera: Arc<dyn Camera>,
}

impl Ingestion {
    /// Production wiring: docx parser, tesseract CLI, raster cropper, V4L2 camera via ffmpeg.
    pub fn from_config(config: &Config) -> Self {
        Self {
            documents: Arc::new(docx::DocxExtractor),
            recognizer: Arc::new(ocr::TesseractRecognizer::new(
                config.tesseract_bin.clone(),
                config.ocr_languages.clone(),
            )),
            cropper: Arc::new(crop::RasterCropper),
            camera: Arc::new(camera::DeviceCamera::new(
                config.camera_device.clone(),
                config.ffmpeg_bin.clone(),
            )),
        }
    }
}
