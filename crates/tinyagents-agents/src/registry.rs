//! The static agent catalog
//!
//! Lookup is exact-match on the command keyword. A miss is reported to the
//! user as an unrecognized command, never treated as fatal.

/// A single micro-agent: a command keyword bound to a fixed system
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDefinition {
    /// Unique command keyword (`/name` in chat)
    pub name: &'static str,
    /// Emoji shown next to the agent in the welcome listing
    pub emoji: &'static str,
    /// Human-readable summary
    pub description: &'static str,
    /// System-level instruction handed to the completion provider
    pub instruction: &'static str,
}

static AGENTS: &[AgentDefinition] = &[
    AgentDefinition {
        name: "meme_persona",
        emoji: "\u{1F602}",
        description: "Turn your idea into a caption for a viral meme.",
        instruction: "You are a meme generator. Given an idea, write a short, funny, \
            viral meme-style caption. Add 3-5 relevant trending hashtags. Reply with \
            the caption and the hashtags only.",
    },
    AgentDefinition {
        name: "viral_pitch",
        emoji: "\u{1F4BC}",
        description: "Write a cold, concise pitch for LinkedIn.",
        instruction: "You are a LinkedIn copywriting expert. Write a direct message of \
            at most 50 words based on the user's idea. The tone must be professional \
            but catchy. The goal is to get a reply.",
    },
    AgentDefinition {
        name: "roast_generator",
        emoji: "\u{1F525}",
        description: "Give me a topic and I'll roast it, gently.",
        instruction: "You are a comedian who specialises in roasts. Given a word or a \
            phrase, write a funny, biting joke that is never offensive or vulgar. Be \
            creative and unexpected.",
    },
    AgentDefinition {
        name: "email_writer",
        emoji: "\u{1F4E7}",
        description: "Write professional, persuasive emails.",
        instruction: "You are a professional email writer. Given the user's intent, \
            draft a clear, persuasive email of at most 120 words, starting with a \
            subject line. Reply with the email only.",
    },
    AgentDefinition {
        name: "tweet_generator",
        emoji: "\u{1F426}",
        description: "Create catchy, viral tweets.",
        instruction: "You are a social media copywriter. Given an idea, write one \
            catchy tweet under 280 characters. Add 1-3 fitting hashtags. Reply with \
            the tweet only.",
    },
];

/// All registered agents, in listing order.
pub fn all_agents() -> &'static [AgentDefinition] {
    AGENTS
}

/// Exact-match lookup by command keyword.
pub fn find_agent(name: &str) -> Option<&'static AgentDefinition> {
    AGENTS.iter().find(|a| a.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_match() {
        assert!(find_agent("meme_persona").is_some());
        assert!(find_agent("meme").is_none());
        assert!(find_agent("MEME_PERSONA").is_none());
        assert!(find_agent("").is_none());
    }

    #[test]
    fn names_are_unique() {
        for (i, a) in all_agents().iter().enumerate() {
            for b in &all_agents()[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn every_agent_carries_an_instruction() {
        for agent in all_agents() {
            assert!(!agent.instruction.is_empty(), "{} has no instruction", agent.name);
            assert!(!agent.description.is_empty(), "{} has no description", agent.name);
        }
    }
}
