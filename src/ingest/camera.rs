// src/ingest/camera.rs

use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{Camera, CameraError, CameraStream};
use crate::utils::data_url::DataUrl;

/// A V4L2 video device, with single frames grabbed through `ffmpeg`.
#[derive(Debug, Clone)]
pub struct DeviceCamera {
    device: PathBuf,
    ffmpeg: String,
}

impl DeviceCamera {
    pub fn new(device: PathBuf, ffmpeg: impl Into<String>) -> Self {
        Self {
            device,
            ffmpeg: ffmpeg.into(),
        }
    }
}

#[async_trait]
impl Camera for DeviceCamera {
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError> {
        let device = self.device.clone();
        let handle = tokio::task::spawn_blocking(move || File::open(&device))
            .await
            .map_err(|e| CameraError::Denied { reason: e.to_string() })?
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::PermissionDenied => format!("permission denied for {}", self.device.display()),
                    _ => format!("cannot open {}: {}", self.device.display(), e),
                };
                tracing::warn!("Camera unavailable: {}", reason);
                CameraError::Denied { reason }
            })?;

        tracing::info!("Camera stream acquired on {}", self.device.display());
        Ok(Box::new(DeviceStream {
            device: self.device.clone(),
            ffmpeg: self.ffmpeg.clone(),
            handle: Some(handle),
        }))
    }
}

/// Holds the device open for as long as the session is in camera mode.
#[derive(Debug)]
pub struct DeviceStream {
    device: PathBuf,
    ffmpeg: String,
    handle: Option<File>,
}

#[async_trait]
impl CameraStream for DeviceStream {
    async fn capture_frame(&mut self) -> Result<DataUrl, CameraError> {
        let output = Command::new(&self.ffmpeg)
            .args(["-loglevel", "error", "-f", "v4l2", "-i"])
            .arg(&self.device)
            .args(["-frames:v", "1", "-f", "image2", "-vcodec", "mjpeg", "pipe:1"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CameraError::Capture { reason: format!("failed to start {}: {}", self.ffmpeg, e) })?;

        if !output.status.success() || output.stdout.is_empty() {
            let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!("Frame capture failed: {}", reason);
            return Err(CameraError::Capture { reason });
        }

        Ok(DataUrl::new("image/jpeg", output.stdout))
    }
}

impl Drop for DeviceStream {
    fn drop(&mut self) {
        if self.handle.take().is_some() {
            tracing::info!("Camera stream released on {}", self.device.display());
        }
    }
}
