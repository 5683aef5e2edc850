//! HTTP request handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sms_alerts::{deliver, Decision, DeliverySummary};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::audit::AuditRecord;
use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
}

/// Handle GET /health - health check endpoint.
pub async fn health_check(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Handle POST /sms - route one alert payload.
///
/// The response depends only on the routing decision. A `Sent` decision is
/// answered immediately and delivered on a tracked background task, which
/// writes the audit line once every address has been tried.
pub async fn receive_alert(State(state): State<Arc<GatewayState>>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("alert", %request_id);

    let decision = span.in_scope(|| state.router().route(&body));
    let status = StatusCode::from_u16(decision.http_status()).unwrap_or(StatusCode::OK);
    let response_body = decision.response_body();

    match decision {
        Decision::Sent { .. } => {
            let task = deliver_and_audit(Arc::clone(&state), request_id, body, decision);
            state.spawn_delivery(task.instrument(span));
        }
        Decision::Ignored { .. } | Decision::Rejected { .. } => {
            audit(&state, request_id, &body, &decision, None)
                .instrument(span)
                .await;
        }
    }

    (status, response_body).into_response()
}

async fn deliver_and_audit(
    state: Arc<GatewayState>,
    request_id: Uuid,
    body: Bytes,
    decision: Decision,
) {
    let Decision::Sent {
        message, addresses, ..
    } = &decision
    else {
        return;
    };

    let report = deliver(state.transport(), addresses, message).await;
    if !report.is_complete() {
        warn!(
            failed = report.failed(),
            attempted = report.attempted,
            "some SMS deliveries failed"
        );
    }

    audit(&state, request_id, &body, &decision, Some(report.summary())).await;
}

async fn audit(
    state: &GatewayState,
    request_id: Uuid,
    body: &[u8],
    decision: &Decision,
    delivery: Option<DeliverySummary>,
) {
    let Some(log) = state.audit() else {
        return;
    };
    let mut record = AuditRecord::new(request_id, body, decision);
    if let Some(summary) = delivery {
        record = record.with_delivery(summary);
    }
    log.record(&record).await;
}
