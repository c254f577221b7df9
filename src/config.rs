// src/config.rs

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use dotenvy::dotenv;

/// Bounds for the number of questions a single generation request may ask for.
pub const MIN_QUESTIONS: u8 = 1;
pub const MAX_QUESTIONS: u8 = 15;
pub const DEFAULT_NUM_QUESTIONS: u8 = 5;

/// Teacher-side difficulty score, rendered into the prompt as `N/10`.
pub const MAX_DIFFICULTY: u8 = 10;
pub const DEFAULT_DIFFICULTY: u8 = 5;

/// Free-response answers scoring strictly above this are displayed as correct.
pub const DEFAULT_SHORT_ANSWER_PASS_SCORE: f64 = 8.0;

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY (or API_KEY) must be set")]
    MissingApiKey,

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub gemini_timeout_secs: u64,
    pub bind_addr: String,
    pub rust_log: String,
    pub log_dir: String,
    pub ocr_languages: String,
    pub tesseract_bin: String,
    pub camera_device: PathBuf,
    pub ffmpeg_bin: String,
    /// Sessions untouched for this long are evicted.
    pub session_idle_secs: u64,
    pub session_sweep_secs: u64,
    pub short_answer_pass_score: f64,
}

impl Config {
    /// Configuration with every optional setting at its default.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            gemini_api_key: api_key.into(),
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_timeout_secs: 120,
            bind_addr: "0.0.0.0:3000".to_string(),
            rust_log: "info".to_string(),
            log_dir: "logs".to_string(),
            ocr_languages: "vie+eng".to_string(),
            tesseract_bin: "tesseract".to_string(),
            camera_device: PathBuf::from("/dev/video0"),
            ffmpeg_bin: "ffmpeg".to_string(),
            session_idle_secs: 3600,
            session_sweep_secs: 60,
            short_answer_pass_score: DEFAULT_SHORT_ANSWER_PASS_SCORE,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::with_api_key(api_key);

        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
            config.gemini_base_url = base_url;
        }
        config.gemini_timeout_secs = parse_var("GEMINI_TIMEOUT_SECS", config.gemini_timeout_secs)?;

        if let Ok(addr) = env::var("BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.rust_log = env::var("RUST_LOG").unwrap_or(config.rust_log);
        config.log_dir = env::var("LOG_DIR").unwrap_or(config.log_dir);

        config.ocr_languages = env::var("OCR_LANGUAGES").unwrap_or(config.ocr_languages);
        config.tesseract_bin = env::var("TESSERACT_BIN").unwrap_or(config.tesseract_bin);
        if let Ok(device) = env::var("CAMERA_DEVICE") {
            config.camera_device = PathBuf::from(device);
        }
        config.ffmpeg_bin = env::var("FFMPEG_BIN").unwrap_or(config.ffmpeg_bin);

        config.session_idle_secs = parse_var("SESSION_IDLE_SECS", config.session_idle_secs)?;
        config.session_sweep_secs = parse_var("SESSION_SWEEP_SECS", config.session_sweep_secs)?;
        if config.session_sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_SWEEP_SECS",
                value: "0".to_string(),
            });
        }

        config.short_answer_pass_score =
            parse_var("SHORT_ANSWER_PASS_SCORE", config.short_answer_pass_score)?;

        Ok(config)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
