//! Recipient directory: receiver names to destination addresses.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// One receiver entry as written in the directory file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Receiver name, matched against the alert's receiver hint.
    pub name: String,
    /// Comma-separated destination addresses.
    #[serde(default)]
    pub mobile: String,
}

/// The fallback entry as written in the directory file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultReceiverConfig {
    /// Comma-separated destination addresses.
    #[serde(default)]
    pub mobile: String,
}

/// The directory file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Named receivers, in priority order.
    #[serde(default)]
    pub receiver: Vec<ReceiverConfig>,
    /// Fallback addresses.
    #[serde(default)]
    pub default_receiver: DefaultReceiverConfig,
}

/// A receiver with its parsed addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Receiver name.
    pub name: String,
    /// Destination addresses, trimmed and without duplicates.
    pub addresses: Vec<String>,
}

impl Receiver {
    /// Creates a receiver from a comma-separated address list.
    #[must_use]
    pub fn new(name: impl Into<String>, csv: &str) -> Self {
        Self {
            name: name.into(),
            addresses: parse_addresses(csv),
        }
    }
}

/// Addresses selected for a receiver name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Addresses to send to. May be empty.
    pub addresses: &'a [String],
    /// The receiver that matched, or `None` when the default set was used.
    pub receiver: Option<&'a str>,
}

/// Splits a comma-separated address list.
///
/// Entries are trimmed, empty entries are dropped, and repeated entries keep
/// only their first occurrence.
#[must_use]
pub fn parse_addresses(csv: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    csv.split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .filter(|address| seen.insert(*address))
        .map(str::to_string)
        .collect()
}

/// Ordered receivers plus a default address set.
///
/// Read-only once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientDirectory {
    receivers: Vec<Receiver>,
    default_addresses: Vec<String>,
}

impl RecipientDirectory {
    /// Creates a directory from parsed receivers and default addresses.
    #[must_use]
    pub fn new(receivers: Vec<Receiver>, default_addresses: Vec<String>) -> Self {
        Self {
            receivers,
            default_addresses,
        }
    }

    /// Builds a directory from its file representation.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidDirectory` if a receiver has an empty name.
    pub fn from_config(config: &DirectoryConfig) -> Result<Self> {
        let receivers = config
            .receiver
            .iter()
            .map(|entry| {
                if entry.name.trim().is_empty() {
                    return Err(GatewayError::InvalidDirectory {
                        reason: "receiver name cannot be empty".to_string(),
                    });
                }
                Ok(Receiver::new(entry.name.clone(), &entry.mobile))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            receivers,
            parse_addresses(&config.default_receiver.mobile),
        ))
    }

    /// Parses and builds a directory from JSON.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Serialization` for malformed JSON and
    /// `GatewayError::InvalidDirectory` for an invalid entry.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: DirectoryConfig = serde_json::from_str(content)?;
        Self::from_config(&config)
    }

    /// Configured receivers, in priority order.
    #[must_use]
    pub fn receivers(&self) -> &[Receiver] {
        &self.receivers
    }

    /// The fallback address set.
    #[must_use]
    pub fn default_addresses(&self) -> &[String] {
        &self.default_addresses
    }

    /// Selects addresses for `name`.
    ///
    /// The first receiver whose name equals `name` exactly (case-sensitive)
    /// wins. Without a match the default set is returned.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        self.receivers.iter().find(|r| r.name == name).map_or(
            Resolution {
                addresses: &self.default_addresses,
                receiver: None,
            },
            |r| Resolution {
                addresses: &r.addresses,
                receiver: Some(&r.name),
            },
        )
    }

    /// Every known address, deduplicated and sorted.
    #[must_use]
    pub fn all_addresses(&self) -> BTreeSet<&str> {
        self.receivers
            .iter()
            .flat_map(|r| r.addresses.iter())
            .chain(self.default_addresses.iter())
            .map(String::as_str)
            .collect()
    }
}
