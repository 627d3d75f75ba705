//! Language-model completion collaborator and its OpenAI-compatible client.

use std::time::Duration;

use async_trait::async_trait;
use newsbrief_shared::{LlmSection, NewsBriefError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SERVICE: &str = "openai";

/// One completion request: a system instruction, the user content, and an
/// output-token ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub max_output_tokens: u32,
}

/// A text-completion backend.
///
/// Call failures and timeouts map to `Upstream`; a response that cannot be
/// read as text maps to `Parse`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String>;

    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// [`CompletionClient`] for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NewsBriefError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
        })
    }

    /// Build from the `[llm]` config section, reading the key from its env var.
    pub fn from_config(section: &LlmSection) -> Result<Self> {
        let api_key = std::env::var(&section.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                NewsBriefError::config(format!(
                    "language-model API key not found. Set the {} environment variable.",
                    section.api_key_env
                ))
            })?;

        Self::new(
            &section.base_url,
            api_key,
            section.model.clone(),
            Duration::from_secs(section.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.model, max_tokens = prompt.max_output_tokens))]
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: prompt.max_output_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NewsBriefError::upstream(SERVICE, "request timed out")
                } else {
                    NewsBriefError::upstream(SERVICE, e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsBriefError::upstream(SERVICE, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(NewsBriefError::upstream(
                SERVICE,
                format!("HTTP {status}: {snippet}"),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| NewsBriefError::parse(format!("completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| NewsBriefError::parse("completion response has no choices"))?
            .message
            .content
            .unwrap_or_default();

        debug!(reply_chars = content.chars().count(), "completion received");
        Ok(content)
    }

    fn name(&self) -> &'static str {
        SERVICE
    }
}
