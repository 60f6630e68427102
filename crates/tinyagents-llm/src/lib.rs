//! TinyAgents LLM - Completion Provider Abstraction
//!
//! A single interface over the text-generation backend used by the bot:
//!
//! - **Groq** (default): OpenAI-compatible chat completions at
//!   `https://api.groq.com/openai/v1`
//! - **Deterministic**: canned fallback when no API key is configured
//!
//! ## Key Design Principles
//!
//! 1. Providers never panic; every failure maps to an [`LlmError`]
//! 2. Callers own the user-facing fallback text - providers return errors
//! 3. The per-request sampling surface is fixed by the caller (the bot uses
//!    one model, one temperature, one token cap)

pub mod providers;
pub mod types;

pub use providers::*;
pub use types::*;
