//! sms-gateway - receives monitoring alerts and forwards them as SMS.

use std::sync::Arc;

use clap::Parser;
use sms_alerts::{AlertRouter, LogTransport, SmsTransport};
use sms_gateway::{
    load_directory, load_rules, shutdown_signal, AuditLog, GatewayConfig, GatewayServer,
    GatewayState, HttpSmsTransport, DEFAULT_LOG_FILTER,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    let directory = load_directory(&config.receivers)?;
    let rules = load_rules(config.rules.as_deref())?;
    let router = AlertRouter::with_config(
        Arc::new(rules),
        Arc::new(directory),
        config.router_config(),
    );

    let transport: Arc<dyn SmsTransport> = match &config.sms_url {
        Some(url) => {
            info!(url = %url, timeout_secs = config.sms_timeout_secs, "using HTTP SMS transport");
            Arc::new(HttpSmsTransport::new(url.clone(), config.sms_timeout())?)
        }
        None => {
            info!("no SMS URL configured, messages will only be logged");
            Arc::new(LogTransport::default())
        }
    };

    let mut state = GatewayState::new(router, transport);
    if let Some(path) = &config.audit_log {
        let audit = AuditLog::open(path)?;
        info!(path = %audit.path().display(), "audit log enabled");
        state = state.with_audit(audit);
    }

    let server = GatewayServer::new(state);
    server
        .serve_with_shutdown(config.bind, shutdown_signal())
        .await?;
    server.state().drain_deliveries().await;

    Ok(())
}
