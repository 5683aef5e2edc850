//! HTTP gateway that routes monitoring alerts to SMS recipients.
//!
//! `sms-gateway` wraps the [`sms_alerts`] routing core in an axum server:
//!
//! - `POST /sms` accepts an alert payload, routes it and answers with the
//!   decision; the message is then sent to every resolved address in the
//!   background
//! - `GET /health` reports liveness and uptime
//!
//! Configuration comes from the command line (with environment fallbacks) and
//! two JSON files: the recipient directory and the suppression rules. Both are
//! loaded once at startup and shared read-only.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sms_alerts::{AlertRouter, RecipientDirectory, SuppressionRuleTree};
//! use sms_gateway::{GatewayServer, GatewayState};
//!
//! let router = AlertRouter::new(
//!     Arc::new(SuppressionRuleTree::new()),
//!     Arc::new(RecipientDirectory::default()),
//! );
//! let server = GatewayServer::new(GatewayState::dry_run(router));
//! server.serve("0.0.0.0:8080".parse()?).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;
pub mod transport;

pub use audit::{AuditLog, AuditRecord};
pub use config::{load_directory, load_rules, GatewayConfig, DEFAULT_LOG_FILTER};
pub use error::{ServerError, ServerResult};
pub use routes::create_router;
pub use server::{shutdown_signal, GatewayServer};
pub use state::GatewayState;
pub use transport::HttpSmsTransport;
