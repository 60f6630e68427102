//! Inbound command parsing
//!
//! One message, one leading token. The parser knows nothing about the agent
//! registry; it only splits the command keyword from its argument. Telegram
//! appends `@botname` to commands in group chats, so that suffix is
//! stripped from the keyword.

/// A parsed inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    /// `/start`, optionally carrying a deep-link payload
    Start { payload: Option<&'a str> },
    /// `/credits`
    Credits,
    /// `/buy`
    Buy,
    /// Any other `/token`, resolved against the registry by the router
    Other {
        name: &'a str,
        argument: Option<&'a str>,
    },
    /// No leading command marker: acknowledged silently
    Plain,
}

/// Deep-link payloads embedded by the checkout return URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Success,
    Cancel,
}

/// Parse the leading command token of a message.
pub fn parse_command(text: &str) -> Command<'_> {
    let Some(rest) = text.strip_prefix('/') else {
        return Command::Plain;
    };

    let (token, argument) = match rest.split_once(char::is_whitespace) {
        Some((token, tail)) => {
            let tail = tail.trim();
            (token, (!tail.is_empty()).then_some(tail))
        }
        None => (rest, None),
    };

    // "/meme_persona@TinyAgents_bot idea" addresses this bot in a group
    let name = token.split('@').next().unwrap_or(token);

    match name {
        "start" => Command::Start { payload: argument },
        "credits" => Command::Credits,
        "buy" => Command::Buy,
        _ => Command::Other { name, argument },
    }
}

/// Interpret a `/start` deep-link payload, if any.
pub fn start_outcome(payload: Option<&str>) -> Option<StartOutcome> {
    let payload = payload?;
    if payload.starts_with("success") {
        Some(StartOutcome::Success)
    } else if payload.starts_with("cancel") {
        Some(StartOutcome::Cancel)
    } else {
        None
    }
}
