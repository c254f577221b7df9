// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    ai::{AiGateway, GenerativeModel, gemini::GeminiClient},
    config::Config,
    ingest::Ingestion,
    store::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: AiGateway,
    pub sessions: SessionStore,
    pub ingestion: Ingestion,
}

impl AppState {
    pub fn new(config: Config, model: Arc<dyn GenerativeModel>, ingestion: Ingestion) -> Self {
        Self {
            config,
            gateway: AiGateway::new(model),
            sessions: SessionStore::new(),
            ingestion,
        }
    }

    /// Production wiring: Gemini plus the local ingestion tools.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let model = Arc::new(GeminiClient::new(&config)?);
        let ingestion = Ingestion::from_config(&config);
        Ok(Self::new(config, model, ingestion))
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for AiGateway {
    fn from_ref(state: &AppState) -> Self {
        state.gateway.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Ingestion {
    fn from_ref(state: &AppState) -> Self {
        state.ingestion.clone()
    }
}
