//! Outbound message rendering
//!
//! All user-visible text lives here so the handlers stay about control
//! flow. Markdown variants are sent with the Markdown parse mode.

use tinyagents_agents::all_agents;

/// Welcome listing for a bare `/start`.
pub fn welcome() -> String {
    let mut text = String::from("Welcome to Tiny Agents! \u{1F916}\n\n");
    text.push_str("Pick a micro-agent for a specific task:\n\n");
    for agent in all_agents() {
        text.push_str(&format!(
            "{} `/{}` - {}\n",
            agent.emoji, agent.name, agent.description
        ));
    }
    text.push_str(
        "\nUse a command followed by your request. Example:\n\
         `/meme_persona cat playing the piano`\n\n\
         \u{1F4B3} *Credits:* use `/credits` to see your balance and `/buy` to top up.",
    );
    text
}

/// Notice for the `/start success_…` deep link.
///
/// The redirect is unauthenticated, so this must not state that the payment
/// went through; only the signature-verified purchase event adds credits.
pub fn payment_return_notice() -> String {
    "\u{1F389} Thanks! Once your payment is confirmed, the credits will be \
     added to your balance. Check /credits in a moment."
        .to_string()
}

/// Notice for the `/start cancel_…` deep link.
pub fn payment_cancelled() -> String {
    "\u{274C} Payment cancelled. You can try again any time with /buy.".to_string()
}

/// Balance report for `/credits`.
pub fn balance(credits: u64) -> String {
    format!(
        "Your current balance is *{}* credits. Use `/buy` to top up.",
        credits
    )
}

/// Checkout link for `/buy`.
pub fn buy_link(url: &str) -> String {
    format!("Click here to buy credits: [Buy Credits]({})", url)
}

/// Gate refusal when the balance is exhausted.
pub fn out_of_credits() -> String {
    "\u{1F6AB} *Out of credits!* To keep using the agents, buy more with `/buy`.".to_string()
}

/// A debit that should have succeeded did not.
pub fn debit_failed() -> String {
    "\u{26A0}\u{FE0F} Could not deduct a credit. Please try again or contact support."
        .to_string()
}

/// Progress note after a successful debit, before the generation lands.
pub fn credit_used(remaining: u64) -> String {
    format!(
        "\u{2705} Credit used. Remaining balance: *{}*.\n\u{23F3} Working on your request...",
        remaining
    )
}

/// An agent command arrived with no argument.
pub fn usage_hint(command: &str) -> String {
    format!("Usage: `/{} [your request]`", command)
}

/// The leading token matched no agent.
pub fn unrecognized() -> String {
    "Unrecognized command. Use /start to see the list of available agents.".to_string()
}

/// Catch-all when routing itself failed.
pub fn internal_error() -> String {
    "An internal error occurred. Please try again later.".to_string()
}
