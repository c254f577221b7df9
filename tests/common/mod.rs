// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    io::{Cursor, Write},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use edumatrix::{
    ai::{GenerativeModel, ModelError},
    config::Config,
    ingest::{
        Camera, CameraError, CameraStream, Ingestion, IngestionError, OcrProgress, TextRecognizer,
        crop::RasterCropper, docx::DocxExtractor,
    },
    routes,
    state::AppState,
    utils::data_url::DataUrl,
};
use image::{ImageOutputFormat, Rgb, RgbImage};
use serde_json::{Value, json};

/// Replays queued replies in order and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedModel {
    pub fn push_json(&self, reply: Value) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self) {
        self.replies.lock().unwrap().push_back(Err(ModelError::Status {
            status: 500,
            body: "internal".to_string(),
        }));
    }

    /// Makes every later call take `delay` before it answers.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate_json(&self, prompt: &str, _schema: &Value) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyResponse))
    }
}

/// Recognizes every image as the same text.
pub struct FixedRecognizer {
    pub text: String,
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextRecognizer for FixedRecognizer {
    async fn recognize(
        &self,
        image: &DataUrl,
        progress: &(dyn Fn(OcrProgress) + Send + Sync),
    ) -> Result<String, IngestionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !image.is_image() {
            return Err(IngestionError::recognition("not an image"));
        }
        progress(OcrProgress::new("recognizing text", Some(0.5)));
        progress(OcrProgress::new("recognizing text", Some(1.0)));
        Ok(self.text.clone())
    }
}

/// A camera whose streams count how often they are released.
pub struct FakeCamera {
    pub allow: bool,
    pub releases: Arc<AtomicUsize>,
}

#[async_trait]
impl Camera for FakeCamera {
    async fn open(&self) -> Result<Box<dyn CameraStream>, CameraError> {
        if !self.allow {
            return Err(CameraError::Denied {
                reason: "NotAllowedError".to_string(),
            });
        }
        Ok(Box::new(FakeStream {
            releases: self.releases.clone(),
        }))
    }
}

#[derive(Debug)]
pub struct FakeStream {
    releases: Arc<AtomicUsize>,
}

#[async_trait]
impl CameraStream for FakeStream {
    async fn capture_frame(&mut self) -> Result<DataUrl, CameraError> {
        Ok(DataUrl::new("image/png", png_bytes(8, 6)))
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub model: Arc<ScriptedModel>,
    pub recognizer: Arc<FixedRecognizer>,
    pub camera_releases: Arc<AtomicUsize>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_json(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch_json(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a session of the given kind ("teacher" or "student") and returns its id.
    pub async fn create_session(&self, kind: &str) -> String {
        let response = self.post(&format!("/api/{}/sessions", kind)).await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().expect("Session id missing").to_string()
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_camera(true).await
}

/// Spawns the app on a random port with scripted collaborators.
pub async fn spawn_app_with_camera(camera_allowed: bool) -> TestApp {
    let model = Arc::new(ScriptedModel::default());
    let recognizer = Arc::new(FixedRecognizer {
        text: "Lục lạp chứa diệp lục.".to_string(),
        calls: AtomicUsize::new(0),
    });
    let camera_releases = Arc::new(AtomicUsize::new(0));

    let ingestion = Ingestion {
        documents: Arc::new(DocxExtractor),
        recognizer: recognizer.clone(),
        cropper: Arc::new(RasterCropper),
        camera: Arc::new(FakeCamera {
            allow: camera_allowed,
            releases: camera_releases.clone(),
        }),
    };

    let mut config = Config::with_api_key("test-key");
    config.rust_log = "error".to_string();

    let state = AppState::new(config, model.clone(), ingestion);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        model,
        recognizer,
        camera_releases,
    }
}

pub fn question(text: &str, question_type: &str) -> Value {
    match question_type {
        "true/false" => json!({
            "questionText": text,
            "options": ["Đúng", "Sai"],
            "correctAnswerIndex": 0,
            "explanation": "Câu này đúng.",
            "questionType": "true/false"
        }),
        "short-answer" => json!({
            "questionText": text,
            "options": [],
            "correctAnswerIndex": -1,
            "explanation": "Diệp lục hấp thụ ánh sáng.",
            "questionType": "short-answer"
        }),
        _ => json!({
            "questionText": text,
            "options": ["ATP", "DNA", "RNA", "NADPH"],
            "correctAnswerIndex": 0,
            "explanation": "ATP là sản phẩm.",
            "questionType": "multiple-choice"
        }),
    }
}

pub fn feedback(score: f64) -> Value {
    json!({ "score": score, "feedback": "Khá tốt.", "suggestions": "Ôn lại bài." })
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    buffer.into_inner()
}

pub fn png_data_url(width: u32, height: u32) -> String {
    DataUrl::new("image/png", png_bytes(width, height)).to_string()
}

/// A minimal `.docx`: a zip with just `word/document.xml`.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    use zip::{ZipWriter, write::SimpleFileOptions};

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
