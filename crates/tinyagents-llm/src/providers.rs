//! Completion provider implementations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::types::*;

/// Default deadline for one completion round-trip. A hung provider call
/// otherwise blocks the whole webhook invocation.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Get the provider kind
    fn kind(&self) -> ProviderKind;

    /// Check if the provider is usable (configuration present)
    fn is_available(&self) -> bool;

    /// Complete a conversation
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

// ============================================================================
// Groq Provider (OpenAI-compatible chat completions)
// ============================================================================

/// Configuration for the Groq provider
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GroqConfig {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            base_url: std::env::var("TINYAGENTS_GROQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            api_key: std::env::var("GROQ_API_KEY").ok()?,
            model: std::env::var("TINYAGENTS_GROQ_MODEL")
                .unwrap_or_else(|_| "llama3-8b-8192".to_string()),
        })
    }
}

/// Groq cloud provider
pub struct GroqProvider {
    config: GroqConfig,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(config: GroqConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    pub fn from_env() -> Option<Self> {
        Some(Self::new(GroqConfig::from_env()?))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &'static str {
        "Groq"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Groq
    }

    fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let mut messages: Vec<ChatMessage> = vec![];

        // Add system message if present
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        // Add conversation messages
        for msg in &request.messages {
            messages.push(ChatMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: msg.content.clone(),
            });
        }

        let chat_request = ChatRequest {
            model: request.model.unwrap_or_else(|| self.config.model.clone()),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: e.to_string(),
                })?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        let usage = chat_response.usage.unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
            model: Some(self.config.model.clone()),
        })
    }
}

// ============================================================================
// Deterministic Provider (Fallback)
// ============================================================================

/// Deterministic fallback when no completion backend is configured
pub struct DeterministicProvider;

impl DeterministicProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeterministicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for DeterministicProvider {
    fn name(&self) -> &'static str {
        "Deterministic"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Deterministic
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        Err(LlmError::ConfigurationError {
            message: "no completion backend configured".to_string(),
        })
    }
}

// ============================================================================
// Provider selection
// ============================================================================

/// Select a provider from environment variables
///
/// Reads `TINYAGENTS_LLM_PROVIDER` to select the provider:
/// - `groq` (default): Groq cloud API, requires `GROQ_API_KEY`
/// - `deterministic`: no LLM, every call errors with a configuration error
pub fn provider_from_env() -> Arc<dyn CompletionProvider> {
    // Try to load .env file (ignore errors)
    let _ = dotenvy::dotenv();

    let provider_name =
        std::env::var("TINYAGENTS_LLM_PROVIDER").unwrap_or_else(|_| "groq".to_string());

    let kind = ProviderKind::parse(&provider_name).unwrap_or(ProviderKind::Groq);

    match kind {
        ProviderKind::Groq => {
            if let Some(p) = GroqProvider::from_env() {
                Arc::new(p)
            } else {
                tracing::warn!("GROQ_API_KEY not found, using deterministic fallback");
                Arc::new(DeterministicProvider::new())
            }
        }
        ProviderKind::Deterministic => Arc::new(DeterministicProvider::new()),
    }
}
