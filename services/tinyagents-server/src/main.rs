//! TinyAgents Server
//!
//! Webhook server for the TinyAgents bot: Telegram updates in on one
//! route, Stripe purchase events in on another, credits persisted per
//! user and spent one per agent invocation.
//!
//! # Usage
//!
//! ```bash
//! # Start with environment configuration (.env is honored)
//! tinyagents-server
//!
//! # Override the bind address
//! tinyagents-server --host 127.0.0.1 --port 3000
//!
//! # Local development: in-memory ledger, only the bot token required
//! tinyagents-server --dev-mode
//! ```

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tinyagents_agents::InferenceGateway;
use tinyagents_bot::{create_router, AppState};
use tinyagents_ledger::{CreditLedger, MemoryLedger, SupabaseConfig, SupabaseLedger};
use tinyagents_llm::provider_from_env;
use tinyagents_payments::{CheckoutClient, StripeConfig, WebhookVerifier};
use tinyagents_telegram::{TelegramClient, TelegramConfig};

use crate::config::ServerConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// TinyAgents webhook server
#[derive(Parser, Debug)]
#[command(name = "tinyagents-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "TINYAGENTS_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "TINYAGENTS_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TINYAGENTS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json, pretty)
    #[arg(long, env = "TINYAGENTS_LOG_FORMAT", default_value = "pretty")]
    log_format: String,

    /// Development mode: in-memory ledger, relaxed configuration checks
    #[arg(long, env = "TINYAGENTS_DEV_MODE")]
    dev_mode: bool,
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment (ignore errors)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut server_config = ServerConfig::from_env();
    if let Some(host) = args.host {
        server_config.server.host = host;
    }
    if let Some(port) = args.port {
        server_config.server.port = port;
    }
    server_config.logging.level = args.log_level;
    server_config.logging.format = args.log_format;

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dev_mode = args.dev_mode,
        "Starting TinyAgents server"
    );

    // Eager configuration validation: refuse to start on missing
    // entry-point secrets, name every degraded path up front
    let missing = server_config.secrets.missing_required(args.dev_mode);
    if !missing.is_empty() {
        anyhow::bail!("missing configuration: {}", missing.join(", "));
    }
    for (variable, effect) in server_config.secrets.degraded() {
        tracing::warn!(variable, effect, "missing configuration");
    }

    let state = build_state(&server_config, args.dev_mode)?;
    let app = create_router(Arc::new(state));

    let addr = server_config.server.socket_addr()?;

    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        "Server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(server_config.server.shutdown_timeout()))
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber.with(fmt::layer().json().with_target(true)).init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }

    Ok(())
}

/// Assemble the shared application state from validated configuration
fn build_state(config: &ServerConfig, dev_mode: bool) -> anyhow::Result<AppState> {
    let secrets = &config.secrets;

    let token = secrets
        .telegram_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("missing configuration: TELEGRAM_BOT_TOKEN"))?;
    let transport = Arc::new(TelegramClient::new(TelegramConfig::new(token)));

    let ledger: Arc<dyn CreditLedger> = match (&secrets.supabase_url, &secrets.supabase_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Using Supabase ledger");
            Arc::new(SupabaseLedger::new(SupabaseConfig::new(
                url.clone(),
                key.clone(),
            )))
        }
        _ if dev_mode => {
            tracing::warn!("Dev mode: credits held in memory and lost on restart");
            Arc::new(MemoryLedger::new())
        }
        _ => anyhow::bail!("missing configuration: SUPABASE_URL, SUPABASE_KEY"),
    };

    let gateway = InferenceGateway::new(provider_from_env());

    let checkout = CheckoutClient::new(StripeConfig::new(
        secrets.stripe_secret_key.clone().unwrap_or_default(),
        secrets.stripe_price_id.clone().unwrap_or_default(),
        secrets.telegram_bot_name.clone(),
    ));

    let verifier = WebhookVerifier::new(secrets.stripe_webhook_secret.clone().unwrap_or_default());

    Ok(AppState::new(ledger, transport, gateway, checkout, verifier))
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal(timeout: Duration) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    // Allow time for in-flight requests to complete
    tracing::info!(
        timeout_secs = timeout.as_secs(),
        "Waiting for in-flight requests to complete..."
    );

    tokio::time::sleep(timeout).await;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["tinyagents-server", "--port", "8080"]);
        assert_eq!(args.port, Some(8080));
        assert!(!args.dev_mode);
    }

    #[test]
    fn test_dev_mode_flag() {
        let args = Args::parse_from(["tinyagents-server", "--dev-mode"]);
        assert!(args.dev_mode);
    }
}
