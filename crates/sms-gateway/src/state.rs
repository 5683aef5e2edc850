//! Shared state for the gateway server.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use sms_alerts::{AlertRouter, LogTransport, SmsTransport};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::audit::AuditLog;

/// State shared by every request handler.
///
/// Everything here is read-only after startup except the set of in-flight
/// deliveries, which handlers add to and shutdown drains.
#[derive(Debug)]
pub struct GatewayState {
    /// Routing core over the loaded rules and directory.
    router: AlertRouter,
    /// Outbound SMS transport.
    transport: Arc<dyn SmsTransport>,
    /// Optional audit sink.
    audit: Option<AuditLog>,
    /// Deliveries still running after their request was answered.
    deliveries: Mutex<JoinSet<()>>,
    /// Server start time.
    start_time: Instant,
}

impl GatewayState {
    /// Creates state with the given router and transport and no audit sink.
    pub fn new(router: AlertRouter, transport: Arc<dyn SmsTransport>) -> Self {
        Self {
            router,
            transport,
            audit: None,
            deliveries: Mutex::new(JoinSet::new()),
            start_time: Instant::now(),
        }
    }

    /// Creates state that only logs outbound messages.
    pub fn dry_run(router: AlertRouter) -> Self {
        Self::new(router, Arc::new(LogTransport::default()))
    }

    /// Attaches an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// The routing core.
    pub fn router(&self) -> &AlertRouter {
        &self.router
    }

    /// The outbound transport.
    pub fn transport(&self) -> &dyn SmsTransport {
        self.transport.as_ref()
    }

    /// The audit sink, if configured.
    pub fn audit(&self) -> Option<&AuditLog> {
        self.audit.as_ref()
    }

    /// Get server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Runs a delivery in the background, tracked until [`drain_deliveries`].
    ///
    /// Finished tasks are reaped on every call so the set stays small.
    ///
    /// [`drain_deliveries`]: Self::drain_deliveries
    pub fn spawn_delivery<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut deliveries = self.deliveries.lock();
        while let Some(finished) = deliveries.try_join_next() {
            if let Err(e) = finished {
                warn!(error = %e, "delivery task failed");
            }
        }
        deliveries.spawn(task);
    }

    /// Number of deliveries spawned and not yet reaped.
    pub fn pending_deliveries(&self) -> usize {
        self.deliveries.lock().len()
    }

    /// Waits for every tracked delivery to finish.
    pub async fn drain_deliveries(&self) {
        let mut pending = std::mem::take(&mut *self.deliveries.lock());
        if !pending.is_empty() {
            info!(pending = pending.len(), "waiting for in-flight deliveries");
        }
        while let Some(finished) = pending.join_next().await {
            if let Err(e) = finished {
                warn!(error = %e, "delivery task failed");
            }
        }
    }
}
