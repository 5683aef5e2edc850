//! Reduction of inbound payloads to a [`NormalizedAlert`].
//!
//! Two payload shapes are accepted, tried in a fixed order:
//!
//! 1. The aggregator envelope (`receiver` + `alerts` array). Only the first
//!    alert is routed.
//! 2. The metrics-engine single alert, discriminated by a non-empty `state`.
//!
//! Both shapes decode leniently from almost any JSON object, so a schema is
//! only chosen when its discriminator is present and non-empty.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::types::{
    sentinel, AlertStatus, MetricsEngineDetails, NormalizedAlert, SourceSchema,
    ANNOTATION_SUMMARY, LABEL_ALERTNAME, LABEL_SEVERITY, REQUIRED_LABELS,
};

#[derive(Debug, Deserialize)]
struct AggregatorEnvelope {
    #[serde(default)]
    receiver: Option<String>,
    #[serde(default)]
    receivers: Option<Value>,
    #[serde(default)]
    alerts: Vec<AggregatorAlert>,
}

#[derive(Debug, Deserialize)]
struct AggregatorAlert {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
    #[serde(default)]
    annotations: Option<HashMap<String, String>>,
}

impl AggregatorAlert {
    fn severity(&self) -> &str {
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(LABEL_SEVERITY))
            .map_or("", String::as_str)
    }

    fn is_discriminated(&self) -> bool {
        self.status.as_deref().is_some_and(|s| !s.is_empty()) || !self.severity().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct MetricsEngineAlert {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
    #[serde(default)]
    annotations: Option<HashMap<String, String>>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    rule_id: Option<Value>,
}

/// Decodes raw payload bytes into the canonical alert.
///
/// # Errors
///
/// Returns [`ParseError::NoAlerts`] for an aggregator envelope with an empty
/// `alerts` array that is not a metrics-engine alert either, and
/// [`ParseError::InvalidFormat`] when neither schema's discriminator is
/// present. An `alerts` array that fails to decode is reported with the
/// decoder's message.
pub fn normalize(raw: &[u8]) -> Result<NormalizedAlert, ParseError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| ParseError::invalid(format!("payload is not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(ParseError::invalid("payload is not a JSON object"));
    }

    let envelope = match try_aggregator(&value)? {
        EnvelopeMatch::Matched(alert) => return Ok(*alert),
        other => other,
    };

    if let Some(alert) = try_metrics_engine(&value) {
        return Ok(alert);
    }

    match envelope {
        EnvelopeMatch::Empty => Err(ParseError::NoAlerts),
        EnvelopeMatch::Malformed(detail) => Err(ParseError::invalid(format!(
            "malformed aggregator envelope: {detail}"
        ))),
        EnvelopeMatch::Matched(_) | EnvelopeMatch::Absent => Err(ParseError::invalid(
            "payload matches neither the aggregator nor the metrics-engine schema",
        )),
    }
}

/// How far a payload got as an aggregator envelope.
enum EnvelopeMatch {
    /// No `alerts` key, or a first alert without status or severity.
    Absent,
    /// `alerts` is present but does not decode.
    Malformed(String),
    /// `alerts` is an empty array.
    Empty,
    Matched(Box<NormalizedAlert>),
}

fn try_aggregator(value: &Value) -> Result<EnvelopeMatch, ParseError> {
    if value.get("alerts").is_none() {
        return Ok(EnvelopeMatch::Absent);
    }

    let envelope = match AggregatorEnvelope::deserialize(value) {
        Ok(envelope) => envelope,
        Err(e) => return Ok(EnvelopeMatch::Malformed(e.to_string())),
    };

    let Some(first) = envelope.alerts.first() else {
        return Ok(EnvelopeMatch::Empty);
    };

    if !first.is_discriminated() {
        return Ok(EnvelopeMatch::Absent);
    }

    if envelope.receivers.is_some() {
        return Err(ParseError::invalid(
            "ambiguous envelope: legacy `receivers` field is not accepted, use `receiver`",
        ));
    }

    if envelope.alerts.len() > 1 {
        debug!(
            ignored = envelope.alerts.len() - 1,
            "envelope carries several alerts, routing only the first"
        );
    }

    let mut labels = first.labels.clone().unwrap_or_default();
    let annotations = first.annotations.clone().unwrap_or_default();
    let severity = first.severity().to_string();
    let status_text = non_empty_or_sentinel(first.status.as_deref(), "status");

    default_required_labels(&mut labels);
    let annotations = default_summary(annotations, &labels, None);

    Ok(EnvelopeMatch::Matched(Box::new(NormalizedAlert {
        status: AlertStatus::parse(&status_text),
        status_text,
        severity,
        receiver_hint: envelope.receiver.unwrap_or_default(),
        labels,
        annotations,
        schema: SourceSchema::Aggregator,
        details: None,
    })))
}

fn try_metrics_engine(value: &Value) -> Option<NormalizedAlert> {
    let alert = MetricsEngineAlert::deserialize(value).ok()?;
    let state = alert.state.filter(|s| !s.is_empty())?;

    let name = alert.name.unwrap_or_default();
    let mut labels = alert.labels.unwrap_or_default();
    let severity = labels.get(LABEL_SEVERITY).cloned().unwrap_or_default();

    if labels.get(LABEL_ALERTNAME).is_none_or(String::is_empty) && !name.is_empty() {
        labels.insert(LABEL_ALERTNAME.to_string(), name.clone());
    }
    default_required_labels(&mut labels);
    let annotations = default_summary(alert.annotations.unwrap_or_default(), &labels, Some(&name));

    Some(NormalizedAlert {
        status: AlertStatus::parse(&state),
        status_text: state,
        severity,
        receiver_hint: String::new(),
        labels,
        annotations,
        schema: SourceSchema::MetricsEngine,
        details: Some(MetricsEngineDetails {
            name,
            value: render_scalar(alert.value.as_ref()),
            id: render_scalar(alert.id.as_ref()),
            rule_id: render_scalar(alert.rule_id.as_ref()),
        }),
    })
}

fn non_empty_or_sentinel(value: Option<&str>, field: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => sentinel(field),
    }
}

fn default_required_labels(labels: &mut HashMap<String, String>) {
    for key in REQUIRED_LABELS {
        let entry = labels.entry(key.to_string()).or_default();
        if entry.is_empty() {
            *entry = sentinel(key);
        }
    }
}

fn default_summary(
    mut annotations: HashMap<String, String>,
    labels: &HashMap<String, String>,
    name: Option<&str>,
) -> HashMap<String, String> {
    let missing = annotations
        .get(ANNOTATION_SUMMARY)
        .is_none_or(String::is_empty);

    if missing {
        let fallback = name
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| labels.get(LABEL_ALERTNAME).cloned())
            .unwrap_or_else(|| sentinel(LABEL_ALERTNAME));
        annotations.insert(ANNOTATION_SUMMARY.to_string(), fallback);
    }

    annotations
}

fn render_scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn normalize_json(value: &Value) -> Result<NormalizedAlert, ParseError> {
        normalize(value.to_string().as_bytes())
    }

    mod aggregator_tests {
        use super::*;

        #[test]
        fn decodes_first_alert() {
            let payload = json!({
                "receiver": "team-sre",
                "alerts": [
                    {
                        "status": "firing",
                        "labels": {"severity": "critical", "cluster": "c1", "namespace": "n1", "pod": "p1", "alertname": "DiskFull"},
                        "annotations": {"summary": "disk full"}
                    },
                    {
                        "status": "resolved",
                        "labels": {"cluster": "c2"}
                    }
                ]
            });

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.schema, SourceSchema::Aggregator);
            assert_eq!(alert.status, AlertStatus::Firing);
            assert_eq!(alert.status_text, "firing");
            assert_eq!(alert.severity, "critical");
            assert_eq!(alert.receiver_hint, "team-sre");
            assert_eq!(alert.cluster(), "c1");
            assert_eq!(alert.namespace(), "n1");
            assert_eq!(alert.pod(), "p1");
            assert_eq!(alert.summary(), "disk full");
            assert!(alert.details.is_none());
        }

        #[test]
        fn empty_alerts_is_no_alerts() {
            let payload = json!({"receiver": "team-sre", "alerts": []});
            assert_eq!(normalize_json(&payload), Err(ParseError::NoAlerts));
        }

        #[test]
        fn severity_alone_discriminates() {
            let payload = json!({"alerts": [{"labels": {"severity": "warning"}}]});

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.schema, SourceSchema::Aggregator);
            assert_eq!(alert.status, AlertStatus::Unknown);
            assert_eq!(alert.status_text, "unknown-status");
            assert_eq!(alert.receiver_hint, "");
        }

        #[test]
        fn undiscriminated_first_alert_is_invalid() {
            let payload = json!({"receiver": "r", "alerts": [{"labels": {"cluster": "c1"}}]});
            assert!(matches!(
                normalize_json(&payload),
                Err(ParseError::InvalidFormat { .. })
            ));
        }

        #[test]
        fn missing_labels_get_sentinels() {
            let payload = json!({"alerts": [{"status": "firing"}]});

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.cluster(), "unknown-cluster");
            assert_eq!(alert.namespace(), "unknown-namespace");
            assert_eq!(alert.pod(), "unknown-pod");
            assert_eq!(alert.alertname(), "unknown-alertname");
            assert_eq!(alert.summary(), "unknown-alertname");
            assert_eq!(alert.severity, "");
        }

        #[test]
        fn empty_label_values_get_sentinels() {
            let payload = json!({"alerts": [{"status": "firing", "labels": {"cluster": "", "pod": "p1"}}]});

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.cluster(), "unknown-cluster");
            assert_eq!(alert.pod(), "p1");
        }

        #[test]
        fn summary_defaults_to_alertname() {
            let payload = json!({"alerts": [{"status": "resolved", "labels": {"alertname": "KubePodCrashLooping"}}]});

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.summary(), "KubePodCrashLooping");
        }

        #[test]
        fn null_maps_are_treated_as_empty() {
            let payload = json!({"alerts": [{"status": "firing", "labels": null, "annotations": null}]});

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.cluster(), "unknown-cluster");
        }

        #[test]
        fn legacy_receivers_field_is_rejected() {
            let payload = json!({
                "receivers": ["team-sre"],
                "alerts": [{"status": "firing", "labels": {"severity": "critical"}}]
            });

            match normalize_json(&payload) {
                Err(ParseError::InvalidFormat { detail }) => assert!(detail.contains("receivers")),
                other => panic!("expected InvalidFormat, got {other:?}"),
            }
        }

        #[test]
        fn extra_labels_pass_through() {
            let payload = json!({"alerts": [{"status": "firing", "labels": {"topic": "orders", "job": "kafka"}}]});

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.label("topic"), "orders");
            assert_eq!(alert.label("job"), "kafka");
        }
    }

    mod metrics_engine_tests {
        use super::*;

        #[test]
        fn decodes_flat_alert() {
            let payload = json!({
                "state": "firing",
                "name": "CPUHigh",
                "value": 97.5,
                "labels": {"severity": "warning", "instance": "10.0.0.1:9100"},
                "annotations": {},
                "id": "17",
                "rule_id": 42
            });

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.schema, SourceSchema::MetricsEngine);
            assert_eq!(alert.status, AlertStatus::Firing);
            assert_eq!(alert.severity, "warning");
            assert_eq!(alert.alertname(), "CPUHigh");
            assert_eq!(alert.summary(), "CPUHigh");

            let details = alert.details.unwrap();
            assert_eq!(details.name, "CPUHigh");
            assert_eq!(details.value, "97.5");
            assert_eq!(details.id, "17");
            assert_eq!(details.rule_id, "42");
        }

        #[test]
        fn summary_annotation_wins_over_name() {
            let payload = json!({
                "state": "resolved",
                "name": "CPUHigh",
                "annotations": {"summary": "CPU back to normal"}
            });

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.summary(), "CPU back to normal");
        }

        #[test]
        fn empty_state_is_invalid() {
            let payload = json!({"state": "", "name": "CPUHigh"});
            assert!(matches!(
                normalize_json(&payload),
                Err(ParseError::InvalidFormat { .. })
            ));
        }

        #[test]
        fn aggregator_wins_when_both_discriminators_present() {
            let payload = json!({
                "state": "firing",
                "alerts": [{"status": "resolved"}]
            });

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.schema, SourceSchema::Aggregator);
            assert_eq!(alert.status, AlertStatus::Resolved);
        }

        #[test]
        fn empty_alerts_falls_through_to_state() {
            let payload = json!({
                "state": "firing",
                "name": "CPUHigh",
                "labels": {"severity": "critical"},
                "alerts": []
            });

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.schema, SourceSchema::MetricsEngine);
            assert_eq!(alert.status, AlertStatus::Firing);
            assert_eq!(alert.severity, "critical");
            assert_eq!(alert.alertname(), "CPUHigh");
        }

        #[test]
        fn undecodable_alerts_falls_through_to_state() {
            let payload = json!({"state": "resolved", "name": "CPUHigh", "alerts": "none"});

            let alert = normalize_json(&payload).unwrap();
            assert_eq!(alert.schema, SourceSchema::MetricsEngine);
        }
    }

    mod invalid_tests {
        use super::*;

        #[test]
        fn not_json() {
            assert!(matches!(
                normalize(b"not json"),
                Err(ParseError::InvalidFormat { .. })
            ));
        }

        #[test]
        fn not_an_object() {
            assert!(matches!(
                normalize(b"[1, 2, 3]"),
                Err(ParseError::InvalidFormat { .. })
            ));
        }

        #[test]
        fn empty_object() {
            assert!(matches!(
                normalize(b"{}"),
                Err(ParseError::InvalidFormat { .. })
            ));
        }

        #[test]
        fn malformed_envelope_reports_decoder_message() {
            let payload = json!({"receiver": 7, "alerts": []});

            match normalize_json(&payload) {
                Err(ParseError::InvalidFormat { detail }) => {
                    assert!(detail.starts_with("malformed aggregator envelope: "));
                    assert!(detail.contains("invalid type"), "unexpected detail: {detail}");
                }
                other => panic!("expected InvalidFormat, got {other:?}"),
            }
        }

        #[test]
        fn non_string_label_reports_decoder_message() {
            let payload = json!({"alerts": [{"status": "firing", "labels": {"replicas": 3}}]});

            match normalize_json(&payload) {
                Err(ParseError::InvalidFormat { detail }) => {
                    assert!(detail.starts_with("malformed aggregator envelope: "));
                }
                other => panic!("expected InvalidFormat, got {other:?}"),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_objects_without_discriminators_are_invalid(
            keys in prop::collection::hash_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..6)
        ) {
            let mut object = serde_json::Map::new();
            for (k, v) in keys {
                if k == "alerts" || k == "state" {
                    continue;
                }
                object.insert(k, Value::String(v));
            }
            let result = normalize_json(&Value::Object(object));
            prop_assert!(
                matches!(result, Err(ParseError::InvalidFormat { .. })),
                "expected InvalidFormat"
            );
        }

        #[test]
        fn prop_present_labels_pass_through_and_missing_get_sentinels(
            cluster in proptest::option::of("[a-z][a-z0-9-]{0,12}"),
            namespace in proptest::option::of("[a-z][a-z0-9-]{0,12}"),
            pod in proptest::option::of("[a-z][a-z0-9-]{0,12}"),
            alertname in proptest::option::of("[A-Z][A-Za-z]{0,12}"),
        ) {
            let mut labels = serde_json::Map::new();
            for (key, value) in [
                ("cluster", &cluster),
                ("namespace", &namespace),
                ("pod", &pod),
                ("alertname", &alertname),
            ] {
                if let Some(v) = value {
                    labels.insert(key.to_string(), Value::String(v.clone()));
                }
            }
            let payload = json!({"alerts": [{"status": "firing", "labels": labels}]});
            let alert = normalize_json(&payload).unwrap();

            for (key, value) in [
                ("cluster", cluster),
                ("namespace", namespace),
                ("pod", pod),
                ("alertname", alertname),
            ] {
                let expected = value.unwrap_or_else(|| format!("unknown-{key}"));
                prop_assert_eq!(alert.label(key), expected.as_str());
            }
        }
    }
}
