//! Server configuration
//!
//! Everything comes from the environment (with CLI overrides for the bind
//! and logging knobs). Validation runs before any dependent client is
//! built: entry-point secrets are hard requirements, the rest degrade with
//! an explicit operator-visible diagnostic.

use std::net::SocketAddr;
use std::time::Duration;

/// Server binding settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Shutdown grace period in seconds
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 5,
        }
    }
}

impl ServerSettings {
    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Logging settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// External-service credentials, all sourced from the environment
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Bot token from @BotFather
    pub telegram_token: Option<String>,
    /// Bot username, used in checkout return deep links
    pub telegram_bot_name: String,
    /// Groq API key for completions
    pub groq_api_key: Option<String>,
    /// Supabase project URL
    pub supabase_url: Option<String>,
    /// Supabase service key
    pub supabase_key: Option<String>,
    /// Stripe secret API key
    pub stripe_secret_key: Option<String>,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: Option<String>,
    /// Stripe price id of the credit pack
    pub stripe_price_id: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            telegram_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_bot_name: std::env::var("TELEGRAM_BOT_NAME")
                .unwrap_or_else(|_| "TinyAgents_bot".to_string()),
            groq_api_key: std::env::var("GROQ_API_KEY").ok(),
            supabase_url: std::env::var("SUPABASE_URL").ok(),
            supabase_key: std::env::var("SUPABASE_KEY").ok(),
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY").ok(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
            stripe_price_id: std::env::var("STRIPE_PRICE_ID").ok(),
        }
    }

    /// Variables the server cannot start without.
    ///
    /// In dev mode only the bot token is required; the ledger swaps to the
    /// in-memory implementation and the payment webhook is still mounted
    /// but rejects everything (no signing secret means no verification).
    pub fn missing_required(&self, dev_mode: bool) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.telegram_token.is_none() {
            missing.push("TELEGRAM_BOT_TOKEN");
        }
        if !dev_mode {
            if self.stripe_webhook_secret.is_none() {
                missing.push("STRIPE_WEBHOOK_SECRET");
            }
            if self.supabase_url.is_none() {
                missing.push("SUPABASE_URL");
            }
            if self.supabase_key.is_none() {
                missing.push("SUPABASE_KEY");
            }
        }
        missing
    }

    /// Variables whose absence degrades a single path instead of blocking
    /// startup. Paired with the behavior the operator will observe.
    pub fn degraded(&self) -> Vec<(&'static str, &'static str)> {
        let mut out = Vec::new();
        if self.groq_api_key.is_none() {
            out.push(("GROQ_API_KEY", "agent replies fall back to an error string"));
        }
        if self.stripe_secret_key.is_none() {
            out.push(("STRIPE_SECRET_KEY", "/buy reports a configuration error"));
        }
        if self.stripe_price_id.is_none() {
            out.push(("STRIPE_PRICE_ID", "/buy reports a configuration error"));
        }
        out
    }
}

/// Full server configuration
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub logging: LoggingConfig,
    pub secrets: Secrets,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerSettings::default(),
            logging: LoggingConfig::default(),
            secrets: Secrets::from_env(),
        }
    }
}
