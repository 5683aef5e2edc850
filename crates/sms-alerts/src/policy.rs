//! Send policy.

use crate::types::AlertStatus;

/// Severity that makes a firing alert eligible for notification.
pub const CRITICAL_SEVERITY: &str = "critical";

/// Returns true if an alert with this status and severity should be sent.
///
/// Resolved alerts are always sent. Firing alerts are sent only when the
/// severity is exactly `critical`; the comparison is case-sensitive.
#[must_use]
pub fn is_eligible(status: AlertStatus, severity: &str) -> bool {
    match status {
        AlertStatus::Resolved => true,
        AlertStatus::Firing => severity == CRITICAL_SEVERITY,
        AlertStatus::Unknown => false,
    }
}
