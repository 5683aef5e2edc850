//! Single-line SMS text for a canonical alert.
//!
//! Aggregator alerts use the first template whose fields are available:
//!
//! 1. `instance` label: `[status] AlertName: <name> | Instance: <instance> | Sum: <summary>`
//! 2. `topic` or `consumergroup` label:
//!    `[status] <name> | ConsumerGroup: <cg> | Job: <job> | Topic: <topic> | Sum: <summary>`
//! 3. any of `cluster`/`namespace`/`pod`: `[status] <cluster>/<namespace> | <pod> | <summary>`
//! 4. otherwise: `[status] AlertGroup: <group> | AlertName: <name> | Sum: <summary>`
//!
//! Metrics-engine alerts are rendered as `[state] <summary>`.

use std::collections::HashSet;

use crate::types::{NormalizedAlert, SourceSchema, LABEL_CLUSTER, LABEL_NAMESPACE, LABEL_POD};

const LABEL_INSTANCE: &str = "instance";
const LABEL_TOPIC: &str = "topic";
const LABEL_CONSUMER_GROUP: &str = "consumergroup";
const LABEL_JOB: &str = "job";
const LABEL_ALERT_GROUP: &str = "alertgroup";

/// Builds notification text.
///
/// Receivers registered as plain never get the workload template (3); their
/// alerts fall through to the generic one instead.
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    plain_receivers: HashSet<String>,
}

impl MessageBuilder {
    /// Creates a builder with no plain receivers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a receiver whose messages skip the workload template.
    #[must_use]
    pub fn with_plain_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.plain_receivers.insert(receiver.into());
        self
    }

    /// Returns true if `receiver` is registered as plain.
    #[must_use]
    pub fn is_plain(&self, receiver: &str) -> bool {
        self.plain_receivers.contains(receiver)
    }

    /// Renders the message for `alert`, targeted at `receiver`.
    #[must_use]
    pub fn build(&self, alert: &NormalizedAlert, receiver: &str) -> String {
        let status = &alert.status_text;
        let summary = alert.summary();

        if alert.schema == SourceSchema::MetricsEngine {
            return format!("[{status}] {summary}");
        }

        if alert.has_label(LABEL_INSTANCE) {
            return format!(
                "[{status}] AlertName: {} | Instance: {} | Sum: {summary}",
                alert.alertname(),
                alert.label(LABEL_INSTANCE),
            );
        }

        if alert.has_label(LABEL_TOPIC) || alert.has_label(LABEL_CONSUMER_GROUP) {
            return format!(
                "[{status}] {} | ConsumerGroup: {} | Job: {} | Topic: {} | Sum: {summary}",
                alert.alertname(),
                alert.label_or_sentinel(LABEL_CONSUMER_GROUP),
                alert.label_or_sentinel(LABEL_JOB),
                alert.label_or_sentinel(LABEL_TOPIC),
            );
        }

        let has_workload = [LABEL_CLUSTER, LABEL_NAMESPACE, LABEL_POD]
            .iter()
            .any(|key| alert.has_label(key));
        if has_workload && !self.is_plain(receiver) {
            return format!(
                "[{status}] {}/{} | {} | {summary}",
                alert.cluster(),
                alert.namespace(),
                alert.pod(),
            );
        }

        format!(
            "[{status}] AlertGroup: {} | AlertName: {} | Sum: {summary}",
            alert.label_or_sentinel(LABEL_ALERT_GROUP),
            alert.alertname(),
        )
    }
}
