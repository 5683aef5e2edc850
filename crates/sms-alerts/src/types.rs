//! Core types shared by every stage of the routing pipeline.
//!
//! - [`AlertStatus`]: firing/resolved state of an inbound alert
//! - [`SourceSchema`]: which payload shape an alert arrived in
//! - [`NormalizedAlert`]: the canonical, schema-agnostic alert record

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Label key carrying the cluster name.
pub const LABEL_CLUSTER: &str = "cluster";
/// Label key carrying the namespace name.
pub const LABEL_NAMESPACE: &str = "namespace";
/// Label key carrying the pod name.
pub const LABEL_POD: &str = "pod";
/// Label key carrying the alert name.
pub const LABEL_ALERTNAME: &str = "alertname";
/// Label key carrying the severity.
pub const LABEL_SEVERITY: &str = "severity";
/// Annotation key carrying the human summary.
pub const ANNOTATION_SUMMARY: &str = "summary";

/// Labels that are always present after normalization.
pub const REQUIRED_LABELS: [&str; 4] = [LABEL_CLUSTER, LABEL_NAMESPACE, LABEL_POD, LABEL_ALERTNAME];

/// Returns the placeholder used when `field` is missing, e.g. `unknown-cluster`.
#[must_use]
pub fn sentinel(field: &str) -> String {
    format!("unknown-{field}")
}

/// Returns true if `value` is the placeholder for `field`.
#[must_use]
pub fn is_sentinel(field: &str, value: &str) -> bool {
    value
        .strip_prefix("unknown-")
        .is_some_and(|rest| rest == field)
}

/// The state of an inbound alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// The alert is actively firing.
    Firing,
    /// The alert has been resolved.
    Resolved,
    /// The source sent no status, or one we do not recognise.
    #[default]
    Unknown,
}

impl AlertStatus {
    /// Parses a status case-insensitively. Anything unrecognised is `Unknown`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("firing") {
            Self::Firing
        } else if raw.eq_ignore_ascii_case("resolved") {
            Self::Resolved
        } else {
            Self::Unknown
        }
    }

    /// Returns the status as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Resolved => "resolved",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payload shape an alert was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSchema {
    /// Alertmanager-style envelope with a `receiver` and an `alerts` array.
    Aggregator,
    /// Flat single alert from the metrics engine, discriminated by `state`.
    MetricsEngine,
}

impl SourceSchema {
    /// Returns the schema name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregator => "aggregator",
            Self::MetricsEngine => "metrics_engine",
        }
    }

    /// Whether alerts of this schema carry cluster/namespace/pod labels
    /// that the suppression tree can be evaluated against.
    #[must_use]
    pub const fn carries_workload_labels(&self) -> bool {
        matches!(self, Self::Aggregator)
    }
}

impl std::fmt::Display for SourceSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields only the metrics engine sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsEngineDetails {
    /// Rule name reported by the engine.
    pub name: String,
    /// Current value, rendered as text.
    pub value: String,
    /// Alert instance identifier.
    pub id: String,
    /// Identifier of the rule that produced the alert.
    pub rule_id: String,
}

/// The canonical alert record produced regardless of source payload shape.
///
/// Invariants established by the normalizer:
/// - `status_text` is never empty
/// - every key in [`REQUIRED_LABELS`] is present and non-empty
/// - the `summary` annotation is present and non-empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAlert {
    /// Parsed status.
    pub status: AlertStatus,
    /// Status exactly as received, or `unknown-status`.
    pub status_text: String,
    /// Severity as received; empty when absent.
    pub severity: String,
    /// Receiver named by the source; empty when absent.
    pub receiver_hint: String,
    /// Alert labels, including the defaulted required keys.
    pub labels: HashMap<String, String>,
    /// Alert annotations, including the defaulted summary.
    pub annotations: HashMap<String, String>,
    /// The schema this alert was decoded from.
    pub schema: SourceSchema,
    /// Metrics-engine specific fields, if any.
    pub details: Option<MetricsEngineDetails>,
}

impl NormalizedAlert {
    /// Returns a label value, or an empty string when the label is absent.
    #[must_use]
    pub fn label(&self, key: &str) -> &str {
        self.labels.get(key).map_or("", String::as_str)
    }

    /// Returns a label value, or its `unknown-<key>` placeholder.
    #[must_use]
    pub fn label_or_sentinel(&self, key: &str) -> String {
        match self.labels.get(key) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => sentinel(key),
        }
    }

    /// Returns true if the label is present with a real (non-placeholder) value.
    #[must_use]
    pub fn has_label(&self, key: &str) -> bool {
        let value = self.label(key);
        !value.is_empty() && !is_sentinel(key, value)
    }

    /// The cluster label (never empty after normalization).
    #[must_use]
    pub fn cluster(&self) -> &str {
        self.label(LABEL_CLUSTER)
    }

    /// The namespace label (never empty after normalization).
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.label(LABEL_NAMESPACE)
    }

    /// The pod label (never empty after normalization).
    #[must_use]
    pub fn pod(&self) -> &str {
        self.label(LABEL_POD)
    }

    /// The alert name label (never empty after normalization).
    #[must_use]
    pub fn alertname(&self) -> &str {
        self.label(LABEL_ALERTNAME)
    }

    /// The human summary, falling back to the alert name.
    #[must_use]
    pub fn summary(&self) -> &str {
        match self.annotations.get(ANNOTATION_SUMMARY) {
            Some(summary) if !summary.is_empty() => summary,
            _ => self.alertname(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    mod status_tests {
        use super::*;
        use test_case::test_case;

        #[test_case("firing", AlertStatus::Firing ; "lowercase firing")]
        #[test_case("Firing", AlertStatus::Firing ; "capitalised firing")]
        #[test_case("RESOLVED", AlertStatus::Resolved ; "uppercase resolved")]
        #[test_case("pending", AlertStatus::Unknown ; "unrecognised")]
        #[test_case("", AlertStatus::Unknown ; "empty")]
        fn parse(raw: &str, expected: AlertStatus) {
            assert_eq!(AlertStatus::parse(raw), expected);
        }

        #[test]
        fn display() {
            assert_eq!(AlertStatus::Firing.to_string(), "firing");
            assert_eq!(AlertStatus::Resolved.to_string(), "resolved");
            assert_eq!(AlertStatus::Unknown.to_string(), "unknown");
        }
    }

    mod sentinel_tests {
        use super::*;

        #[test]
        fn sentinel_format() {
            assert_eq!(sentinel("cluster"), "unknown-cluster");
        }

        #[test]
        fn is_sentinel_matches_only_own_field() {
            assert!(is_sentinel("pod", "unknown-pod"));
            assert!(!is_sentinel("pod", "unknown-cluster"));
            assert!(!is_sentinel("pod", "api-7d9f"));
        }
    }

    mod alert_tests {
        use super::*;

        fn alert_with(labels: &[(&str, &str)], summary: Option<&str>) -> NormalizedAlert {
            NormalizedAlert {
                status: AlertStatus::Firing,
                status_text: "firing".to_string(),
                severity: "critical".to_string(),
                receiver_hint: String::new(),
                labels: labels
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                annotations: summary
                    .map(|s| (ANNOTATION_SUMMARY.to_string(), s.to_string()))
                    .into_iter()
                    .collect(),
                schema: SourceSchema::Aggregator,
                details: None,
            }
        }

        #[test]
        fn summary_falls_back_to_alertname() {
            let alert = alert_with(&[("alertname", "DiskFull")], None);
            assert_eq!(alert.summary(), "DiskFull");

            let alert = alert_with(&[("alertname", "DiskFull")], Some(""));
            assert_eq!(alert.summary(), "DiskFull");

            let alert = alert_with(&[("alertname", "DiskFull")], Some("disk at 99%"));
            assert_eq!(alert.summary(), "disk at 99%");
        }

        #[test]
        fn has_label_ignores_placeholders() {
            let alert = alert_with(&[("instance", "unknown-instance"), ("topic", "orders")], None);
            assert!(!alert.has_label("instance"));
            assert!(alert.has_label("topic"));
            assert!(!alert.has_label("job"));
        }

        #[test]
        fn label_or_sentinel() {
            let alert = alert_with(&[("job", "")], None);
            assert_eq!(alert.label_or_sentinel("job"), "unknown-job");
            assert_eq!(alert.label_or_sentinel("topic"), "unknown-topic");
        }
    }
}
