//! Decision orchestrator.
//!
//! [`AlertRouter`] is the entry point of the crate. It turns raw payload bytes
//! into a [`Decision`]: normalize, check suppression, apply the send policy,
//! then build the message and resolve recipients.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::directory::RecipientDirectory;
use crate::error::ParseError;
use crate::message::MessageBuilder;
use crate::normalize::normalize;
use crate::policy::is_eligible;
use crate::rules::SuppressionRuleTree;
use crate::types::{MetricsEngineDetails, SourceSchema};

/// Reason reported when the send policy rejects an alert.
pub const DEFAULT_RULES_REASON: &str = "default rules";

/// Receiver used for metrics-engine alerts unless configured otherwise.
pub const DEFAULT_METRICS_RECEIVER: &str = "alert-devops";

/// HTTP status suggested for accepted payloads.
pub const STATUS_OK: u16 = 200;

/// HTTP status suggested for rejected payloads.
pub const STATUS_BAD_REQUEST: u16 = 400;

/// The outcome of routing one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The alert was understood but will not be sent.
    Ignored {
        /// Why: a suppression rule, or the send policy.
        reason: String,
    },
    /// The payload could not be understood.
    Rejected {
        /// Suggested HTTP status.
        status_hint: u16,
        /// What was wrong with the payload.
        #[serde(serialize_with = "serialize_display")]
        error: ParseError,
    },
    /// The alert should be sent.
    Sent {
        /// Text to send.
        message: String,
        /// Destination addresses. May be empty.
        addresses: Vec<String>,
        /// The receiver that matched, or `None` for the default set.
        receiver_name: Option<String>,
        /// Engine-side identifiers, for metrics-engine alerts only.
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<MetricsEngineDetails>,
    },
}

impl Decision {
    /// Creates a rejection with a 400 status hint.
    #[must_use]
    pub const fn rejected(error: ParseError) -> Self {
        Self::Rejected {
            status_hint: STATUS_BAD_REQUEST,
            error,
        }
    }

    /// Short name of the decision.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ignored { .. } => "ignored",
            Self::Rejected { .. } => "rejected",
            Self::Sent { .. } => "sent",
        }
    }

    /// Suggested HTTP status for the alert source.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Rejected { status_hint, .. } => *status_hint,
            Self::Ignored { .. } | Self::Sent { .. } => STATUS_OK,
        }
    }

    /// Human-readable response body restating the outcome.
    #[must_use]
    pub fn response_body(&self) -> String {
        match self {
            Self::Ignored { reason } => format!("Alert ignored: {reason}"),
            Self::Rejected { error, .. } => error.to_string(),
            Self::Sent { .. } => "Alert processed".to_string(),
        }
    }
}

fn serialize_display<S: Serializer>(error: &ParseError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Configuration for the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Receiver name used for metrics-engine alerts.
    pub metrics_receiver: String,
    /// Message templates.
    pub messages: MessageBuilder,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            metrics_receiver: DEFAULT_METRICS_RECEIVER.to_string(),
            messages: MessageBuilder::default(),
        }
    }
}

impl RouterConfig {
    /// Sets the receiver used for metrics-engine alerts.
    #[must_use]
    pub fn with_metrics_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.metrics_receiver = receiver.into();
        self
    }

    /// Sets the message builder.
    #[must_use]
    pub fn with_messages(mut self, messages: MessageBuilder) -> Self {
        self.messages = messages;
        self
    }
}

/// Stateless per-request router over shared read-only configuration.
#[derive(Debug, Clone)]
pub struct AlertRouter {
    rules: Arc<SuppressionRuleTree>,
    directory: Arc<RecipientDirectory>,
    config: RouterConfig,
}

impl AlertRouter {
    /// Creates a router with the default configuration.
    #[must_use]
    pub fn new(rules: Arc<SuppressionRuleTree>, directory: Arc<RecipientDirectory>) -> Self {
        Self::with_config(rules, directory, RouterConfig::default())
    }

    /// Creates a router with a custom configuration.
    #[must_use]
    pub fn with_config(
        rules: Arc<SuppressionRuleTree>,
        directory: Arc<RecipientDirectory>,
        config: RouterConfig,
    ) -> Self {
        Self {
            rules,
            directory,
            config,
        }
    }

    /// The suppression rules in use.
    #[must_use]
    pub fn rules(&self) -> &SuppressionRuleTree {
        &self.rules
    }

    /// The recipient directory in use.
    #[must_use]
    pub fn directory(&self) -> &RecipientDirectory {
        &self.directory
    }

    /// Routes a payload against the current wall clock.
    #[must_use]
    pub fn route(&self, raw: &[u8]) -> Decision {
        self.route_at(raw, Utc::now())
    }

    /// Routes a payload as of `now`.
    #[must_use]
    pub fn route_at(&self, raw: &[u8], now: DateTime<Utc>) -> Decision {
        debug!(payload = %String::from_utf8_lossy(raw), "alert payload received");

        let decision = self.decide(raw, now);

        match &decision {
            Decision::Ignored { reason } => info!(reason = %reason, "alert ignored"),
            Decision::Rejected { error, .. } => {
                info!(kind = error.kind(), error = %error, "alert rejected");
            }
            Decision::Sent {
                message,
                addresses,
                receiver_name,
                details,
            } => info!(
                message = %message,
                recipients = addresses.len(),
                receiver = receiver_name.as_deref().unwrap_or("default"),
                rule = details.as_ref().map(|d| d.name.as_str()),
                value = details.as_ref().map(|d| d.value.as_str()),
                alert_id = details.as_ref().map(|d| d.id.as_str()),
                rule_id = details.as_ref().map(|d| d.rule_id.as_str()),
                "alert routed"
            ),
        }

        decision
    }

    fn decide(&self, raw: &[u8], now: DateTime<Utc>) -> Decision {
        let alert = match normalize(raw) {
            Ok(alert) => alert,
            Err(e) => return Decision::rejected(e),
        };

        if alert.schema.carries_workload_labels() {
            let verdict = self
                .rules
                .check(alert.cluster(), alert.namespace(), alert.pod(), now);
            if verdict.suppressed {
                return Decision::Ignored {
                    reason: verdict.reason,
                };
            }
        }

        if !is_eligible(alert.status, &alert.severity) {
            return Decision::Ignored {
                reason: DEFAULT_RULES_REASON.to_string(),
            };
        }

        let target = match alert.schema {
            SourceSchema::Aggregator => alert.receiver_hint.as_str(),
            SourceSchema::MetricsEngine => self.config.metrics_receiver.as_str(),
        };

        let message = self.config.messages.build(&alert, target);
        let resolution = self.directory.resolve(target);

        Decision::Sent {
            message,
            addresses: resolution.addresses.to_vec(),
            receiver_name: resolution.receiver.map(str::to_string),
            details: alert.details,
        }
    }
}
