//! Gateway configuration: command line, environment and config files.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use sms_alerts::{
    MessageBuilder, RecipientDirectory, RouterConfig, SuppressionRuleTree,
    DEFAULT_METRICS_RECEIVER,
};
use tracing::info;

use crate::error::{ServerError, ServerResult};

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "sms_gateway=info,sms_alerts=info";

/// Command-line configuration for the gateway.
#[derive(Debug, Clone, Parser)]
#[command(name = "sms-gateway")]
#[command(about = "Routes monitoring alerts to SMS recipients")]
#[command(version)]
pub struct GatewayConfig {
    /// Address to listen on
    #[arg(long, env = "SMS_GATEWAY_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Recipient directory file
    #[arg(long, env = "SMS_GATEWAY_RECEIVERS", default_value = "config.json")]
    pub receivers: PathBuf,

    /// Suppression rule file (no rules when omitted)
    #[arg(long, env = "SMS_GATEWAY_RULES")]
    pub rules: Option<PathBuf>,

    /// Append-only audit log file
    #[arg(long, env = "SMS_GATEWAY_AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Outbound SMS API endpoint (dry run when omitted)
    #[arg(long, env = "SMS_GATEWAY_SMS_URL")]
    pub sms_url: Option<String>,

    /// Timeout for each outbound SMS request, in seconds
    #[arg(long, env = "SMS_GATEWAY_SMS_TIMEOUT_SECS", default_value_t = 10)]
    pub sms_timeout_secs: u64,

    /// Receiver used for metrics-engine alerts
    #[arg(long, env = "SMS_GATEWAY_METRICS_RECEIVER", default_value = DEFAULT_METRICS_RECEIVER)]
    pub metrics_receiver: String,

    /// Receiver whose messages never use the cluster/namespace template
    #[arg(long = "plain-receiver", env = "SMS_GATEWAY_PLAIN_RECEIVERS", value_delimiter = ',')]
    pub plain_receivers: Vec<String>,

    /// Emit logs as JSON
    #[arg(long, env = "SMS_GATEWAY_LOG_JSON")]
    pub log_json: bool,
}

impl GatewayConfig {
    /// Timeout for each outbound SMS request.
    #[must_use]
    pub const fn sms_timeout(&self) -> Duration {
        Duration::from_secs(self.sms_timeout_secs)
    }

    /// Router settings derived from the command line.
    #[must_use]
    pub fn router_config(&self) -> RouterConfig {
        let messages = self
            .plain_receivers
            .iter()
            .filter(|name| !name.trim().is_empty())
            .fold(MessageBuilder::new(), |builder, name| {
                builder.with_plain_receiver(name.trim())
            });

        RouterConfig::default()
            .with_metrics_receiver(self.metrics_receiver.clone())
            .with_messages(messages)
    }
}

/// Loads the recipient directory file.
///
/// # Errors
///
/// Returns `ServerError::Config` if the file cannot be read or is invalid.
pub fn load_directory(path: &Path) -> ServerResult<RecipientDirectory> {
    let content = fs::read_to_string(path).map_err(|e| ServerError::config(path, e))?;
    let directory = RecipientDirectory::from_json(&content).map_err(|e| ServerError::config(path, e))?;

    info!(
        path = %path.display(),
        receivers = directory.receivers().len(),
        addresses = directory.all_addresses().len(),
        "recipient directory loaded"
    );

    Ok(directory)
}

/// Loads the suppression rule file, or an empty tree when no path is given.
///
/// # Errors
///
/// Returns `ServerError::Config` if the file cannot be read or is invalid.
pub fn load_rules(path: Option<&Path>) -> ServerResult<SuppressionRuleTree> {
    let Some(path) = path else {
        info!("no suppression rules configured");
        return Ok(SuppressionRuleTree::new());
    };

    let content = fs::read_to_string(path).map_err(|e| ServerError::config(path, e))?;
    let rules = SuppressionRuleTree::from_json(&content).map_err(|e| ServerError::config(path, e))?;

    info!(
        path = %path.display(),
        rules = rules.rule_count(),
        "suppression rules loaded"
    );

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    mod cli_tests {
        use super::*;

        #[test]
        fn defaults() {
            let config = GatewayConfig::try_parse_from(["sms-gateway"]).unwrap();

            assert_eq!(config.bind.port(), 8080);
            assert_eq!(config.receivers, PathBuf::from("config.json"));
            assert!(config.rules.is_none());
            assert!(config.audit_log.is_none());
            assert!(config.sms_url.is_none());
            assert_eq!(config.sms_timeout(), Duration::from_secs(10));
            assert_eq!(config.metrics_receiver, "alert-devops");
            assert!(config.plain_receivers.is_empty());
            assert!(!config.log_json);
        }

        #[test]
        fn explicit_arguments() {
            let config = GatewayConfig::try_parse_from([
                "sms-gateway",
                "--bind",
                "127.0.0.1:9000",
                "--rules",
                "ignore-alert.json",
                "--sms-url",
                "http://sms.internal/send",
                "--plain-receiver",
                "legacy-ops",
                "--plain-receiver",
                "alert-d1,alert-d2",
                "--log-json",
            ])
            .unwrap();

            assert_eq!(config.bind.port(), 9000);
            assert_eq!(config.rules, Some(PathBuf::from("ignore-alert.json")));
            assert_eq!(config.plain_receivers, vec!["legacy-ops", "alert-d1", "alert-d2"]);
            assert!(config.log_json);

            let router = config.router_config();
            assert!(router.messages.is_plain("alert-d2"));
            assert_eq!(router.metrics_receiver, "alert-devops");
        }

        #[test]
        fn invalid_bind_address() {
            assert!(GatewayConfig::try_parse_from(["sms-gateway", "--bind", "nowhere"]).is_err());
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn load_directory_from_file() {
            let file = file_with(
                r#"{"receiver": [{"name": "alert-k8s", "mobile": "0901,0902"}],
                    "default_receiver": {"mobile": "0900"}}"#,
            );

            let directory = load_directory(file.path()).unwrap();
            assert_eq!(directory.resolve("alert-k8s").addresses.len(), 2);
        }

        #[test]
        fn missing_directory_file() {
            let err = load_directory(Path::new("/nonexistent/config.json")).unwrap_err();
            assert!(matches!(err, ServerError::Config { .. }));
            assert!(err.to_string().contains("/nonexistent/config.json"));
        }

        #[test]
        fn no_rules_path_is_empty_tree() {
            assert!(load_rules(None).unwrap().is_empty());
        }

        #[test]
        fn invalid_rules_file() {
            let file = file_with(
                r#"{"clusterGroups": [{"name": "", "clusters": ["c1"]}]}"#,
            );
            let err = load_rules(Some(file.path())).unwrap_err();
            assert!(err.to_string().contains("invalid suppression rule"));
        }

        #[test]
        fn load_rules_from_file() {
            let file = file_with(r#"{"ignore": [{"cluster": "c1", "time": {"start": "2025-01-01T00:00:00Z"}}]}"#);
            let rules = load_rules(Some(file.path())).unwrap();
            assert_eq!(rules.rule_count(), 1);
        }
    }
}
