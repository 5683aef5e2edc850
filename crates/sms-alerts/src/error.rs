//! Error types for the sms-alerts crate.

use thiserror::Error;

/// Reasons an inbound payload could not be turned into a canonical alert.
///
/// Both variants are terminal for the request and map to a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload matched none of the accepted schemas.
    #[error("invalid alert format: {detail}")]
    InvalidFormat {
        /// What was wrong with the payload.
        detail: String,
    },

    /// The payload is an aggregator envelope with an empty `alerts` array.
    #[error("no alerts in payload")]
    NoAlerts,
}

impl ParseError {
    /// Creates an [`ParseError::InvalidFormat`] with the given detail.
    #[must_use]
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidFormat {
            detail: detail.into(),
        }
    }

    /// Short machine-readable name of the defect.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat { .. } => "invalid_format",
            Self::NoAlerts => "no_alerts",
        }
    }
}

/// Errors raised while validating configuration or delivering messages.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A suppression rule is malformed.
    #[error("invalid suppression rule: {reason}")]
    InvalidRule {
        /// The reason the rule is invalid.
        reason: String,
    },

    /// The recipient directory is malformed.
    #[error("invalid recipient directory: {reason}")]
    InvalidDirectory {
        /// The reason the directory is invalid.
        reason: String,
    },

    /// A single outbound send failed.
    #[error("delivery to {address} failed: {reason}")]
    Delivery {
        /// Destination address of the failed send.
        address: String,
        /// Transport-reported cause.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for configuration and delivery operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
