//! Client for the text-completion service behind "help me write".
//!
//! One request per call, no retries. The HTTP exchange sits behind
//! [`CompletionTransport`]; [`SuggestionClient`] owns the prompt, the
//! timeout and the mapping of outcomes onto [`AiError`].

use crate::config::AiConfig;
use crate::domain::{AiError, FieldId};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// What the user asked for help with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub field: FieldId,
    pub current_text: String,
    pub context: Option<String>,
}

impl SuggestionRequest {
    pub fn new(field: FieldId, current_text: impl Into<String>) -> Self {
        Self {
            field,
            current_text: current_text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

pub fn build_prompt(request: &SuggestionRequest) -> String {
    let notes = request.current_text.trim();
    let notes = if notes.is_empty() { "No notes provided." } else { notes };
    let context = request
        .context
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("None.");

    format!(
        "You are helping a citizen fill out a government social support application.\n\
         Write a clear, respectful, and honest paragraph for the field \"{field}\".\n\
         \n\
         User rough notes:\n\
         {notes}\n\
         \n\
         Additional context (if any):\n\
         {context}\n\
         \n\
         Constraints:\n\
         - Neutral and formal tone.\n\
         - No exaggeration.\n\
         - Do not invent facts.\n\
         - 3–6 sentences maximum.",
        field = request.field.label(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Outbound chat-completions body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Performs the HTTP exchange. Implementations must be cancel-safe: the
/// client drops the returned future when the timeout fires.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> anyhow::Result<TransportResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ReqwestTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("social-support/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl CompletionTransport for ReqwestTransport {
    async fn send(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> anyhow::Result<TransportResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

/// Maps a completed exchange onto suggestion text or a classified failure.
pub fn classify_response(response: TransportResponse) -> Result<String, AiError> {
    match response.status {
        200..=299 => {}
        401 => return Err(AiError::Authentication),
        429 => return Err(AiError::RateLimited),
        status if status >= 500 => return Err(AiError::ServiceUnavailable { status }),
        status => return Err(AiError::Http { status }),
    }

    let json: serde_json::Value =
        serde_json::from_str(&response.body).map_err(|e| AiError::Unknown {
            detail: format!("response body is not JSON: {e}"),
        })?;

    json.pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or(AiError::EmptyResponse)
}

pub struct SuggestionClient {
    transport: Arc<dyn CompletionTransport>,
    api_key: Option<SecretString>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl SuggestionClient {
    pub fn new(transport: Arc<dyn CompletionTransport>, api_key: Option<SecretString>) -> Self {
        Self {
            transport,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &AiConfig) -> Result<Self, reqwest::Error> {
        let transport = Arc::new(ReqwestTransport::new(config.endpoint.clone())?);
        let api_key = config
            .api_key
            .as_ref()
            .map(|key| SecretString::from(key.expose_secret().to_owned()));
        Ok(Self::new(transport, api_key)
            .with_model(config.model.clone())
            .with_timeout(config.timeout))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn completion_request(&self, request: &SuggestionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(request),
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub async fn request_suggestion(&self, request: &SuggestionRequest) -> Result<String, AiError> {
        let Some(api_key) = self.api_key.as_ref() else {
            tracing::warn!(field = %request.field, "suggestion requested without a configured API key");
            return Err(AiError::Configuration);
        };

        let body = self.completion_request(request);
        let started = Instant::now();
        tracing::info!(field = %request.field, model = %self.model, "requesting suggestion");

        let outcome = tokio::time::timeout(
            self.timeout,
            self.transport.send(api_key.expose_secret(), &body),
        )
        .await;

        let result = match outcome {
            Err(_) => Err(AiError::Timeout),
            Ok(Err(e)) => Err(AiError::Unknown {
                detail: e.to_string(),
            }),
            Ok(Ok(response)) => classify_response(response),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => tracing::info!(field = %request.field, elapsed_ms, chars = text.len(), "suggestion received"),
            Err(error) => tracing::warn!(field = %request.field, elapsed_ms, code = error.code(), %error, "suggestion failed"),
        }
        result
    }
}
