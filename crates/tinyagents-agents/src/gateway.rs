//! Inference gateway
//!
//! Wraps the completion provider with the bot's fixed sampling surface and
//! a user-safe fallback. The router never sees a provider error: a failed
//! generation becomes the fallback string and the request keeps going.

use std::sync::Arc;

use tinyagents_llm::{CompletionProvider, CompletionRequest, LlmError, Message};
use tracing::warn;

use crate::registry::AgentDefinition;

/// Sent to the user when the provider call fails at runtime.
pub const GENERATION_FALLBACK: &str =
    "Oops! Something went wrong on the AI side. Please try again in a moment.";

/// Sent when no completion backend is configured at all. Distinct from the
/// runtime fallback so a missing API key reads as an operator problem.
pub const UNCONFIGURED_FALLBACK: &str =
    "The AI service is not available. Check the completion API key configuration.";

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 150;

/// Stateless wrapper around a completion provider
#[derive(Clone)]
pub struct InferenceGateway {
    provider: Arc<dyn CompletionProvider>,
}

impl InferenceGateway {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Run one agent over the user's text.
    ///
    /// Always returns something sendable: the generated content, or the
    /// fallback string when the provider errors or produces nothing.
    pub async fn generate(&self, agent: &AgentDefinition, user_text: &str) -> String {
        let request = CompletionRequest::new(vec![Message::user(user_text)])
            .with_system(agent.instruction)
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_OUTPUT_TOKENS);

        match self.provider.complete(request).await {
            Ok(response) if !response.content.trim().is_empty() => response.content,
            Ok(_) => {
                warn!(agent = agent.name, "provider returned empty content");
                GENERATION_FALLBACK.to_string()
            }
            Err(e @ LlmError::ConfigurationError { .. }) => {
                warn!(agent = agent.name, error = %e, "no completion backend");
                UNCONFIGURED_FALLBACK.to_string()
            }
            Err(e) => {
                warn!(agent = agent.name, error = %e, "generation failed");
                GENERATION_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tinyagents_llm::{CompletionResponse, LlmError, ProviderKind};

    struct ScriptedProvider {
        reply: Option<&'static str>,
        unconfigured: bool,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn ok(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                unconfigured: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                unconfigured: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn unconfigured() -> Self {
            Self {
                reply: None,
                unconfigured: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Deterministic
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> tinyagents_llm::Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(request.system.is_some(), "agent instruction must be set");
            match self.reply {
                Some(reply) => Ok(CompletionResponse::new(reply)),
                None if self.unconfigured => Err(LlmError::ConfigurationError {
                    message: "no completion backend configured".to_string(),
                }),
                None => Err(LlmError::NetworkError {
                    message: "connection reset".to_string(),
                }),
            }
        }
    }

    fn test_agent() -> &'static AgentDefinition {
        crate::registry::find_agent("meme_persona").unwrap()
    }

    #[tokio::test]
    async fn generate_returns_provider_content() {
        let provider = Arc::new(ScriptedProvider::ok("a caption #meme"));
        let gateway = InferenceGateway::new(provider.clone());

        let reply = gateway.generate(test_agent(), "cat playing piano").await;

        assert_eq!(reply, "a caption #meme");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generate_falls_back_on_error() {
        let gateway = InferenceGateway::new(Arc::new(ScriptedProvider::failing()));
        let reply = gateway.generate(test_agent(), "anything").await;
        assert_eq!(reply, GENERATION_FALLBACK);
    }

    #[tokio::test]
    async fn generate_falls_back_on_empty_content() {
        let gateway = InferenceGateway::new(Arc::new(ScriptedProvider::ok("   ")));
        let reply = gateway.generate(test_agent(), "anything").await;
        assert_eq!(reply, GENERATION_FALLBACK);
    }

    #[tokio::test]
    async fn missing_backend_reads_as_a_configuration_problem() {
        let gateway = InferenceGateway::new(Arc::new(ScriptedProvider::unconfigured()));
        let reply = gateway.generate(test_agent(), "anything").await;
        assert_eq!(reply, UNCONFIGURED_FALLBACK);
    }
}
