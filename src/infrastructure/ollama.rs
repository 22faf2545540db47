//! Ollama LLM client (OpenAI-compatible chat completions)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{LlmError, LlmPort, LlmRequest, LlmResponse, MessageRole};

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";

/// Generation is slow on local hardware; the narrator timeout above this
/// is what actually bounds a turn.
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: normalize_base_url(base_url),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL)
    }
}

/// Accepts both `http://host:11434` and `http://host:11434/v1`
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed).to_string()
}

#[async_trait]
impl LlmPort for OllamaClient {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let api_request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: build_messages(&request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!("{}: {}", status, body)));
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        convert_response(api_response, &self.model)
    }
}

fn build_messages(request: &LlmRequest) -> Vec<WireMessage> {
    let system = request.system_prompt.iter().map(|prompt| WireMessage {
        role: "system".to_string(),
        content: Some(prompt.clone()),
    });
    let conversation = request.messages.iter().map(|message| WireMessage {
        role: match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
        .to_string(),
        content: Some(message.content.clone()),
    });
    system.chain(conversation).collect()
}

fn convert_response(response: ChatCompletionResponse, requested_model: &str) -> Result<LlmResponse, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in LLM response".to_string()))?;

    if choice.finish_reason.as_deref() == Some("length") {
        tracing::debug!("LLM response truncated at max_tokens");
    }

    Ok(LlmResponse {
        content: choice.message.content.unwrap_or_default(),
        model: response.model.unwrap_or_else(|| requested_model.to_string()),
        tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
    })
}

// ===== Wire types =====

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::outbound::ChatMessage;

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
        assert_eq!(normalize_base_url("http://10.0.0.2:11434/v1"), "http://10.0.0.2:11434");
        let client = OllamaClient::new("http://localhost:11434/v1/", "llama3");
        assert_eq!(client.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_system_prompt_leads_the_conversation() {
        let request = LlmRequest::new(vec![ChatMessage::user("I open the door")])
            .with_system_prompt("You narrate a fantasy game.");

        let messages = build_messages(&request);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content.as_deref(), Some("I open the door"));
    }

    #[test]
    fn test_response_conversion() {
        let raw = r#"{
            "model": "llama3",
            "choices": [{"message": {"role": "assistant", "content": "The door creaks."}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();

        let converted = convert_response(response, "fallback-model").unwrap();

        assert_eq!(converted.content, "The door creaks.");
        assert_eq!(converted.model, "llama3");
        assert_eq!(converted.tokens_used, 16);
    }

    #[test]
    fn test_empty_choices_is_invalid() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            convert_response(response, "m"),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
