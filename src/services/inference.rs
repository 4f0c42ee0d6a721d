//! Inference service client
//!
//! The production implementation speaks to the internal LLM gateway over
//! HTTP. The trait is the seam: the orchestrator only sees `infer`, and
//! tests inject scripted implementations.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::CoreError;

/// Natural-language inference collaborator.
///
/// No format guarantee on the returned text; callers run it through the
/// structured response parser. Retries, if any, belong to the gateway.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn infer(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, CoreError>;
}

/// HTTP client for the inference gateway.
#[derive(Clone)]
pub struct HttpInferenceClient {
    client: Client,
    base_url: String,
    token: String,
}

/// Error response from the gateway.
#[derive(Debug, Deserialize)]
struct GatewayErrorResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct InferRequest<'a> {
    prompt: &'a str,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct InferResponse {
    text: String,
}

impl HttpInferenceClient {
    /// Create a new gateway client.
    pub fn new(base_url: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "Inference client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Check gateway health.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("Inference service health check failed")?
            .error_for_status()
            .context("Inference service unhealthy")?;

        Ok(())
    }
}

#[async_trait]
impl InferenceService for HttpInferenceClient {
    async fn infer(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, CoreError> {
        let url = format!("{}/v1/infer", self.base_url);

        debug!(url = %url, prompt_chars = prompt.len(), "Inference request");

        let response = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.token)
            .header("Content-Type", "application/json")
            .json(&InferRequest {
                prompt,
                temperature,
                max_tokens,
            })
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Inference request failed");
                CoreError::Inference(format!("inference service unavailable: {}", e))
            })?;

        let status = response.status();

        if status.is_success() {
            let body: InferResponse = response.json().await.map_err(|e| {
                error!(error = %e, "Failed to parse inference response envelope");
                CoreError::Inference(format!("invalid inference response: {}", e))
            })?;

            // An empty completion is a service failure, not a parseable result.
            if body.text.trim().is_empty() {
                return Err(CoreError::Inference("empty response".to_string()));
            }

            Ok(body.text)
        } else {
            let message = response
                .json::<GatewayErrorResponse>()
                .await
                .ok()
                .map(|e| e.message)
                .unwrap_or_else(|| format!("inference service error: {}", status));

            if status == StatusCode::UNAUTHORIZED {
                error!("Inference service authentication failed");
            } else {
                error!(status = %status, message = %message, "Inference service error");
            }

            Err(CoreError::Inference(message))
        }
    }
}
