// src/models/draft.rs

use serde::{Serialize, Serializer};

use crate::ingest::CameraStream;

/// Context text being assembled for a generation request, plus the state of
/// the ingestion helpers feeding it.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDraft {
    pub context: String,

    /// Image waiting for the crop step, as a data URL.
    pub image_to_crop: Option<String>,

    /// Live camera stream; dropping it releases the device.
    #[serde(rename = "cameraActive", serialize_with = "serialize_active")]
    camera: Option<Box<dyn CameraStream>>,

    /// Progress line of the running ingestion step.
    pub processing_status: Option<String>,
}

fn serialize_active<S: Serializer>(
    camera: &Option<Box<dyn CameraStream>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(camera.is_some())
}

impl ContextDraft {
    pub fn replace_context(&mut self, text: String) {
        self.context = text;
    }

    /// Appends recognised text, separated from existing context by a blank line.
    pub fn append_context(&mut self, text: &str) {
        if self.context.is_empty() {
            self.context = text.to_string();
        } else {
            self.context.push_str("\n\n");
            self.context.push_str(text);
        }
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }

    /// Stores a freshly opened stream. Any previous stream is released.
    pub fn attach_camera(&mut self, stream: Box<dyn CameraStream>) {
        self.camera = Some(stream);
    }

    pub fn take_camera(&mut self) -> Option<Box<dyn CameraStream>> {
        self.camera.take()
    }

    /// Drops the camera stream, if any. Returns whether one was open.
    pub fn release_camera(&mut self) -> bool {
        self.camera.take().is_some()
    }
}
