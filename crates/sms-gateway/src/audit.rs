//! Append-only audit log.
//!
//! One JSON object per line, per request: the raw payload, the decision and,
//! when messages were sent, the delivery summary.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use sms_alerts::{Decision, DeliverySummary};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ServerError, ServerResult};

/// One audit line.
#[derive(Debug, Serialize)]
pub struct AuditRecord<'a> {
    /// Request identifier, also attached to tracing events.
    pub request_id: Uuid,
    /// When the request was handled.
    pub timestamp: DateTime<Utc>,
    /// The payload as received (lossy UTF-8).
    pub payload: String,
    /// The routing decision.
    pub decision: &'a Decision,
    /// Delivery outcome, present only for sent alerts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliverySummary>,
}

impl<'a> AuditRecord<'a> {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(request_id: Uuid, payload: &[u8], decision: &'a Decision) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            decision,
            delivery: None,
        }
    }

    /// Attaches a delivery summary.
    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliverySummary) -> Self {
        self.delivery = Some(delivery);
        self
    }
}

/// Audit sink backed by a file opened in append mode.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl AuditLog {
    /// Opens (or creates) the audit file for appending.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> ServerResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ServerError::config(&path, e))?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Path of the audit file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a record. Failures are logged and otherwise ignored.
    ///
    /// The write runs on the blocking pool so a slow disk never stalls the
    /// runtime's worker threads.
    pub async fn record(&self, record: &AuditRecord<'_>) {
        if let Err(e) = self.try_record(record).await {
            warn!(
                path = %self.path.display(),
                request_id = %record.request_id,
                error = %e,
                "failed to write audit record"
            );
        }
    }

    async fn try_record(&self, record: &AuditRecord<'_>) -> ServerResult<()> {
        let json = serde_json::to_string(record).map_err(|e| ServerError::Internal(e.to_string()))?;
        let line = format!("{json}\n");
        let file = Arc::clone(&self.file);

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut file = file.lock();
            file.write_all(line.as_bytes())?;
            file.flush()
        })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
        Ok(())
    }
}
