//! Prompt Relay — forward a prompt to the generation API, return its body as-is

use crate::api::{GeminiClient, GenerateContentRequest, GenerationBackend};
use crate::config::RelayConfig;
use crate::error::{ServiceError, ServiceResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

pub const RELAY_FAILED: &str = "Failed to fetch from Gemini";
pub const MISSING_KEY_MESSAGE: &str = "Missing GEMINI_API_KEY in environment variables";
pub const MISSING_PROMPT_MESSAGE: &str = "Missing prompt in request body";

#[derive(Clone)]
pub struct PromptRelay {
    api_key: Option<String>,
    backend: Arc<dyn GenerationBackend>,
}

impl PromptRelay {
    pub fn new(api_key: Option<String>, backend: Arc<dyn GenerationBackend>) -> Self {
        Self { api_key, backend }
    }

    /// Relay backed by the real Gemini client
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.api_key.clone(), Arc::new(GeminiClient::new(config)))
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Relay `{ prompt, tools? }`. The credential is checked before the body.
    pub async fn relay(&self, body: &Value) -> ServiceResult<Value> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("{}", MISSING_KEY_MESSAGE);
            return Err(ServiceError::Configuration(MISSING_KEY_MESSAGE.to_string()));
        };

        let request = build_request(body)?;

        info!(
            prompt_chars = request.contents[0].parts[0].text.chars().count(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Relaying prompt"
        );

        self.backend
            .generate_content(api_key, &request)
            .await
            .map_err(|e| {
                error!("Error calling Gemini: {:#}", e);
                ServiceError::Upstream {
                    context: RELAY_FAILED,
                    detail: format!("{e:#}"),
                }
            })
    }
}

fn build_request(body: &Value) -> ServiceResult<GenerateContentRequest> {
    let prompt = body
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ServiceError::InvalidInput(MISSING_PROMPT_MESSAGE.to_string()))?;

    let tools = match body.get("tools") {
        Some(Value::Array(tools)) => Some(tools.clone()),
        _ => None,
    };

    Ok(GenerateContentRequest::from_prompt(prompt, tools))
}
