//! Chat completions client for the language model gateway

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sonoreport_core::ReportError;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Anything that turns a prompt into generated text.
///
/// One call is one upstream request: implementations must not retry.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ReportError>;
}

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Request body for the chat completions API
#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message>,
}

/// Response from the chat completions API
#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Error detail from the API
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl ChatClient {
    /// Create a client with a bounded request timeout
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReportError::Gateway(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single user message at temperature 0 and return the reply text
    pub async fn complete(&self, prompt: &str) -> Result<String, ReportError> {
        let request = ApiRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if let Ok(api_err) = serde_json::from_str::<ApiError>(&body) {
                return Err(ReportError::Gateway(format!(
                    "Model API error ({}): {}",
                    status, api_err.error.message
                )));
            }
            return Err(ReportError::Gateway(format!(
                "Model API error ({}): {}",
                status, body
            )));
        }

        let parsed = response
            .json::<ApiResponse>()
            .await
            .map_err(|e| ReportError::Gateway(format!("Failed to parse response: {}", e)))?;

        extract_text(parsed)
    }

    fn transport_error(&self, err: reqwest::Error) -> ReportError {
        if err.is_timeout() {
            ReportError::Gateway(format!(
                "Model request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            ReportError::Gateway(format!("HTTP request failed: {}", err))
        }
    }
}

#[async_trait]
impl LanguageModel for ChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, ReportError> {
        self.complete(prompt).await
    }
}

/// First non-empty choice of a response
fn extract_text(response: ApiResponse) -> Result<String, ReportError> {
    response
        .choices
        .into_iter()
        .filter_map(|choice| choice.message.content)
        .find(|content| !content.trim().is_empty())
        .ok_or_else(|| ReportError::Gateway("No text content in response".to_string()))
}
