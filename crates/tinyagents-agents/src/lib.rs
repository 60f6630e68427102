//! TinyAgents Agents - Micro-agent catalog and inference gateway
//!
//! Each agent is a named, fixed instruction template applied to
//! user-supplied text through the completion provider. The catalog is a
//! static table built into the binary: no dynamic registration, no
//! user-modifiable prompts.

pub mod gateway;
pub mod registry;

pub use gateway::{InferenceGateway, GENERATION_FALLBACK, UNCONFIGURED_FALLBACK};
pub use registry::{all_agents, find_agent, AgentDefinition};
