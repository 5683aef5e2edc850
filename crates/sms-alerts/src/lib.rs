//! Alert routing core for an SMS alert gateway.
//!
//! `sms-alerts` turns inbound monitoring payloads into routing decisions:
//! whether an alert is muted, whether it is worth a text message, what the
//! message says and who receives it.
//!
//! # Features
//!
//! - **Two payload shapes**: Alertmanager-style envelopes and flat metrics-engine alerts
//! - **Suppression rules**: cluster, namespace and pod quiet periods with wildcards
//! - **Send policy**: resolved alerts, and firing alerts marked `critical`
//! - **Message templates**: picked by which labels the alert carries
//! - **Recipient directory**: named receivers with a default fallback
//! - **Delivery seam**: per-address fan-out over a pluggable transport
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sms_alerts::{AlertRouter, Decision, RecipientDirectory, SuppressionRuleTree};
//!
//! let directory = RecipientDirectory::from_json(
//!     r#"{"receiver": [{"name": "alert-k8s", "mobile": "0901, 0902"}],
//!         "default_receiver": {"mobile": "0900"}}"#,
//! )
//! .unwrap();
//! let router = AlertRouter::new(Arc::new(SuppressionRuleTree::new()), Arc::new(directory));
//!
//! let payload = br#"{"receiver": "alert-k8s", "alerts": [{"status": "firing",
//!     "labels": {"severity": "critical", "cluster": "c1", "namespace": "n1", "pod": "p1"},
//!     "annotations": {"summary": "disk full"}}]}"#;
//!
//! match router.route(payload) {
//!     Decision::Sent { message, addresses, .. } => {
//!         assert_eq!(message, "[firing] c1/n1 | p1 | disk full");
//!         assert_eq!(addresses, vec!["0901", "0902"]);
//!     }
//!     other => panic!("unexpected decision: {other:?}"),
//! }
//! ```
//!
//! # Delivering
//!
//! The router only decides. Sending goes through an [`SmsTransport`]:
//!
//! ```rust,ignore
//! use sms_alerts::{deliver, LogTransport};
//!
//! if let Decision::Sent { message, addresses, .. } = router.route(payload) {
//!     let report = deliver(&LogTransport::default(), &addresses, &message).await;
//!     println!("{} of {} sent", report.succeeded, report.attempted);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod decision;
pub mod delivery;
pub mod directory;
pub mod error;
pub mod message;
pub mod normalize;
pub mod policy;
pub mod rules;
pub mod types;

// Re-export main types at crate root
pub use decision::{AlertRouter, Decision, RouterConfig, DEFAULT_METRICS_RECEIVER};
pub use delivery::{deliver, DeliveryReport, DeliverySummary, LogTransport, SmsTransport};
pub use directory::{parse_addresses, DirectoryConfig, Receiver, RecipientDirectory, Resolution};
pub use error::{GatewayError, ParseError, Result};
pub use message::MessageBuilder;
pub use normalize::normalize;
pub use policy::is_eligible;
pub use rules::{SuppressionLevel, SuppressionRuleTree, SuppressionVerdict, TimeWindow};
pub use types::{AlertStatus, MetricsEngineDetails, NormalizedAlert, SourceSchema};
