// src/ingest/ocr.rs

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{IngestionError, OcrProgress, TextRecognizer};
use crate::utils::data_url::DataUrl;

/// OCR through the `tesseract` command-line engine.
///
/// Each call is a fresh worker: the image goes to a temporary file, the
/// child process is killed if the future is dropped, and the file is
/// removed on every exit path.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    languages: String,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(
        &self,
        image: &DataUrl,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, IngestionError> {
        if !image.is_image() {
            return Err(IngestionError::recognition(format!(
                "expected an image, got {}",
                image.mime
            )));
        }

        progress(OcrProgress::new("loading image", Some(0.0)));
        let file = tempfile::Builder::new()
            .prefix("edumatrix-ocr-")
            .suffix(&format!(".{}", image.extension()))
            .tempfile()
            .map_err(|e| IngestionError::recognition(format!("temp file: {}", e)))?;
        tokio::fs::write(file.path(), &image.bytes)
            .await
            .map_err(|e| IngestionError::recognition(format!("temp file: {}", e)))?;

        progress(OcrProgress::new(
            format!("initializing tesseract ({})", self.languages),
            Some(0.1),
        ));
        let child = Command::new(&self.binary)
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to start {}: {}", self.binary, e);
                IngestionError::recognition(format!("failed to start {}: {}", self.binary, e))
            })?;

        progress(OcrProgress::new("recognizing text", Some(0.5)));
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| IngestionError::recognition(e.to_string()))?;

        drop(file);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("Tesseract failed ({}): {}", output.status, stderr.trim());
            return Err(IngestionError::recognition(stderr.trim()));
        }

        progress(OcrProgress::new("recognizing text", Some(1.0)));
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::info!("OCR recognized {} characters", text.chars().count());
        Ok(text)
    }
}
