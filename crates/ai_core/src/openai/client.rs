//! Chat-completions client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::ports::{
    InferenceEngine, InferenceMessage, InferenceRequest, InferenceResponse, TokenUsage,
};

/// Finish reason and error codes that mean the provider filtered the output
const CONTENT_FILTER_MARKERS: [&str; 3] = ["content_filter", "content_policy_violation", "moderation"];

/// Inference engine for OpenAI-compatible providers
#[derive(Debug)]
pub struct OpenAiCompatibleEngine {
    client: Client,
    config: InferenceConfig,
}

impl OpenAiCompatibleEngine {
    /// Create a new engine; fails if the config is invalid
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            model = %config.default_model,
            "Initialized chat-completions engine"
        );

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Get the model to use for a request
    fn resolve_model<'a>(&'a self, request: &'a InferenceRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn transport_error(&self, err: &reqwest::Error) -> InferenceError {
        InferenceError::from_transport(err, self.config.timeout_ms)
    }
}

/// Chat-completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [InferenceMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Error envelope used by OpenAI-compatible APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

fn is_content_filter(marker: &str) -> bool {
    CONTENT_FILTER_MARKERS.contains(&marker)
}

/// Map a non-success response to an [`InferenceError`]
fn classify_failure(status: StatusCode, body: &str) -> InferenceError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let message = envelope
        .as_ref()
        .map_or_else(|| body.to_string(), |e| e.error.message.clone());

    let filtered = envelope.as_ref().is_some_and(|e| {
        e.error.code.as_deref().is_some_and(is_content_filter)
            || e.error.kind.as_deref().is_some_and(is_content_filter)
    });
    if filtered {
        return InferenceError::ContentFiltered(message);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        InferenceError::RateLimited
    } else if status.is_server_error() {
        InferenceError::ServerError(format!("Status {status}: {message}"))
    } else if status == StatusCode::NOT_FOUND
        && envelope
            .as_ref()
            .and_then(|e| e.error.code.as_deref())
            .is_some_and(|c| c == "model_not_found")
    {
        InferenceError::ModelNotAvailable(message)
    } else {
        InferenceError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl InferenceEngine for OpenAiCompatibleEngine {
    #[instrument(skip(self, request), fields(model = %self.resolve_model(&request)))]
    async fn generate(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let body = ChatCompletionRequest {
            model: self.resolve_model(&request),
            messages: &request.messages,
            max_tokens: request.max_tokens.or(Some(self.config.max_tokens)),
            temperature: request.temperature.or(Some(self.config.temperature)),
            top_p: request.top_p.or(Some(self.config.top_p)),
            stream: false,
        };

        debug!("Sending chat-completions request");

        let response = self
            .authorized(self.client.post(self.api_url("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Inference request failed");
            return Err(classify_failure(status, &body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::InvalidResponse("response has no choices".to_string()))?;

        if choice.finish_reason.as_deref().is_some_and(is_content_filter) {
            return Err(InferenceError::ContentFiltered(
                "completion stopped by content filter".to_string(),
            ));
        }

        let usage = completion.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        debug!(tokens = ?usage, finish_reason = ?choice.finish_reason, "Inference completed");

        Ok(InferenceResponse {
            content: choice.message.content.unwrap_or_default(),
            model: completion.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<bool, InferenceError> {
        let response = self
            .authorized(self.client.get(self.api_url("models")))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) if e.is_timeout() || e.is_connect() => Ok(false),
            Err(e) => Err(InferenceError::RequestFailed(e.to_string())),
        }
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
