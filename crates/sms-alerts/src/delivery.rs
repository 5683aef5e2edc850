//! Outbound delivery seam.
//!
//! [`SmsTransport`] is the one-address-at-a-time send primitive. [`deliver`]
//! fans a message out over a list of addresses, isolating failures so that a
//! bad address never stops the rest from being attempted.

use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GatewayError, Result};

/// Sends one text to one address.
///
/// Implementations must be usable behind `Arc<dyn SmsTransport>`.
pub trait SmsTransport: Send + Sync + fmt::Debug {
    /// Returns the transport name, used in logs.
    fn name(&self) -> &str;

    /// Sends `text` to `address`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Delivery` if the send was not accepted.
    fn send<'a>(&'a self, address: &'a str, text: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// A dry-run transport that only logs.
#[derive(Debug, Clone)]
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Creates a new log transport.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogTransport {
    fn default() -> Self {
        Self::new("log")
    }
}

impl SmsTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn send<'a>(&'a self, address: &'a str, text: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            info!(transport = %self.name, address, text, "SMS (dry run)");
            Ok(())
        })
    }
}

/// Outcome of a fan-out.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Number of sends attempted.
    pub attempted: usize,
    /// Number of sends that succeeded.
    pub succeeded: usize,
    /// One entry per failed send.
    pub failures: Vec<GatewayError>,
}

impl DeliveryReport {
    /// Number of failed sends.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if every attempted send succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// A serializable summary, for audit records.
    #[must_use]
    pub fn summary(&self) -> DeliverySummary {
        DeliverySummary {
            attempted: self.attempted,
            succeeded: self.succeeded,
            failures: self.failures.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Serializable view of a [`DeliveryReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliverySummary {
    /// Number of sends attempted.
    pub attempted: usize,
    /// Number of sends that succeeded.
    pub succeeded: usize,
    /// Failure descriptions.
    pub failures: Vec<String>,
}

/// Sends `text` to every address in turn.
///
/// Blank addresses are skipped. A failed send is logged and recorded in the
/// report, and the remaining addresses are still attempted.
pub async fn deliver<S>(transport: &dyn SmsTransport, addresses: &[S], text: &str) -> DeliveryReport
where
    S: AsRef<str>,
{
    let mut report = DeliveryReport::default();

    for address in addresses.iter().map(|a| a.as_ref().trim()) {
        if address.is_empty() {
            continue;
        }
        report.attempted += 1;

        match transport.send(address, text).await {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                warn!(
                    transport = transport.name(),
                    address,
                    error = %e,
                    "SMS delivery failed"
                );
                report.failures.push(e);
            }
        }
    }

    report
}
