// src/models/session.rs

//! The two flows behind a single session id, and the context-ingestion
//! steps they share.

use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::FlowError,
    ingest::CameraStream,
    models::{draft::ContextDraft, student::StudentSession, teacher::TeacherSession},
};

/// The single action a student session may have in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pending {
    Generating,
    Grading,
    Processing,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Session {
    Teacher(TeacherSession),
    Student(StudentSession),
}

impl Session {
    pub fn id(&self) -> Uuid {
        match self {
            Session::Teacher(s) => s.id,
            Session::Student(s) => s.id,
        }
    }

    pub fn draft(&self) -> &ContextDraft {
        match self {
            Session::Teacher(s) => &s.draft,
            Session::Student(s) => &s.draft,
        }
    }

    pub fn draft_mut(&mut self) -> &mut ContextDraft {
        match self {
            Session::Teacher(s) => &mut s.draft,
            Session::Student(s) => &mut s.draft,
        }
    }

    pub fn as_teacher_mut(&mut self) -> Option<&mut TeacherSession> {
        match self {
            Session::Teacher(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_student_mut(&mut self) -> Option<&mut StudentSession> {
        match self {
            Session::Student(s) => Some(s),
            _ => None,
        }
    }

    /// Context may change while nothing runs and, for students, only during setup.
    pub fn ensure_context_editable(&self) -> Result<(), FlowError> {
        match self {
            Session::Teacher(s) => s.ensure_idle(),
            Session::Student(s) => s.ensure_editable(),
        }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = Some(message.into());
        match self {
            Session::Teacher(s) => s.error = message,
            Session::Student(s) => s.error = message,
        }
    }

    fn clear_error(&mut self) {
        match self {
            Session::Teacher(s) => s.error = None,
            Session::Student(s) => s.error = None,
        }
    }

    /// Marks an ingestion step as running.
    pub fn begin_processing(&mut self, status: impl Into<String>) -> Result<(), FlowError> {
        if let Err(e) = self.ensure_context_editable() {
            self.record_error(e.to_string());
            return Err(e);
        }
        self.clear_error();
        if let Session::Student(s) = self {
            s.pending = Some(Pending::Processing);
        }
        self.draft_mut().processing_status = Some(status.into());
        Ok(())
    }

    /// Progress line of the running step; ignored once the step is over.
    pub fn set_processing_status(&mut self, status: String) {
        let draft = self.draft_mut();
        if draft.processing_status.is_some() {
            draft.processing_status = Some(status);
        }
    }

    pub fn finish_processing(&mut self) {
        if let Session::Student(s) = self {
            if s.pending == Some(Pending::Processing) {
                s.pending = None;
            }
        }
        self.draft_mut().processing_status = None;
    }

    /// Puts an uploaded or captured image in front of the crop step.
    pub fn stage_image(&mut self, data_url: String) -> Result<(), FlowError> {
        self.checked(|session| {
            session.draft_mut().image_to_crop = Some(data_url);
            Ok(())
        })
    }

    /// Takes the staged image for cropping and marks processing as running.
    pub fn begin_crop(&mut self, status: impl Into<String>) -> Result<String, FlowError> {
        let image = self.checked(|session| {
            session
                .draft_mut()
                .image_to_crop
                .take()
                .ok_or_else(|| FlowError::InvalidState("No image is waiting to be cropped".to_string()))
        })?;
        self.begin_processing(status)?;
        Ok(image)
    }

    /// Discards the staged image without recognizing it.
    pub fn cancel_crop(&mut self) -> Result<bool, FlowError> {
        self.checked(|session| Ok(session.draft_mut().image_to_crop.take().is_some()))
    }

    /// Marks the camera as being opened. A second open while this one is
    /// in flight, or while a stream is held, is refused.
    pub fn begin_camera_open(&mut self, status: impl Into<String>) -> Result<(), FlowError> {
        self.checked(|session| {
            if session.draft().camera_active() {
                return Err(FlowError::InvalidState("The camera is already open".to_string()));
            }
            Ok(())
        })?;
        self.begin_processing(status)
    }

    /// Ends the open step and keeps the stream.
    pub fn attach_camera(&mut self, stream: Box<dyn CameraStream>) {
        self.finish_processing();
        self.clear_error();
        self.draft_mut().attach_camera(stream);
    }

    pub fn take_camera(&mut self) -> Result<Box<dyn CameraStream>, FlowError> {
        self.checked(|session| {
            session
                .draft_mut()
                .take_camera()
                .ok_or_else(|| FlowError::InvalidState("The camera is not open".to_string()))
        })
    }

    /// Runs a context step after the editability check, recording its outcome.
    fn checked<T>(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<T, FlowError>,
    ) -> Result<T, FlowError> {
        let result = self.ensure_context_editable().and_then(|_| step(self));
        match &result {
            Ok(_) => self.clear_error(),
            Err(e) => self.record_error(e.to_string()),
        }
        result
    }
}
