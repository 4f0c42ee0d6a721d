use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,

    // Inference service
    pub inference_url: String,
    pub inference_token: String,
    pub inference_timeout_seconds: u64,
    pub inference_temperature: f64,
    pub inference_max_tokens: u32,

    // Analysis
    pub analysis_excerpt_chars: usize,
    pub pass_timeout_seconds: u64,

    // Escalation
    pub review_board_recipients: Vec<String>,
}

impl Settings {
    /// Load `.env` (if present) and read settings from the environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));

        // Inference service
        let inference_url = env::var("INFERENCE_SERVICE_URL")
            .unwrap_or_else(|_| "http://inference:8000".to_string());
        let inference_token =
            env::var("INFERENCE_SERVICE_TOKEN").context("INFERENCE_SERVICE_TOKEN must be set")?;
        let inference_timeout_seconds = env::var("INFERENCE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(120); // 2 minutes default for LLM calls
        let inference_temperature = env::var("INFERENCE_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.2);
        let inference_max_tokens = env::var("INFERENCE_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2048);

        // Analysis
        let analysis_excerpt_chars = env::var("ANALYSIS_EXCERPT_CHARS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(24_000);
        let pass_timeout_seconds = env::var("ANALYSIS_PASS_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(90);

        // Escalation
        let review_board_recipients = env::var("REVIEW_BOARD_RECIPIENTS")
            .unwrap_or_else(|_| "review-board@internal".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Settings {
            env,
            inference_url,
            inference_token,
            inference_timeout_seconds,
            inference_temperature,
            inference_max_tokens,
            analysis_excerpt_chars,
            pass_timeout_seconds,
            review_board_recipients,
        })
    }
}
