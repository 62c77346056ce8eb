//! Gemini generative-language API client — `models/{model}:generateContent`
//!
//! The response body is returned as raw JSON; nothing here interprets it.

use crate::config::RelayConfig;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

/// The key never goes in the URL: reqwest error text includes the URL
const API_KEY_HEADER: &str = "x-goog-api-key";

// ---------------------------------------------------------------------------
// Request structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Body of a `generateContent` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    /// Tool descriptors, forwarded verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
}

impl GenerateContentRequest {
    /// Single-part prompt; empty tool lists are dropped
    pub fn from_prompt(prompt: impl Into<String>, tools: Option<Vec<Value>>) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            tools: tools.filter(|t| !t.is_empty()),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send one request and return the remote JSON body on a success status
    async fn generate_content(&self, api_key: &str, request: &GenerateContentRequest)
        -> Result<Value>;
}

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &RelayConfig) -> Self {
        // Transport defaults only: no timeout override
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    /// POST /models/{model}:generateContent, key in `x-goog-api-key`
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<Value> {
        let url = self.endpoint();
        debug!(model = %self.model, tools = request.tools.is_some(), "Calling Gemini");

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(%status, "Gemini API error details: {}", body);
            anyhow::bail!("Gemini API error {}", status);
        }

        let data: Value = resp.json().await.map_err(reqwest::Error::without_url)?;
        Ok(data)
    }
}
