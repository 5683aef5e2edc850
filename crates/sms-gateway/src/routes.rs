//! Route configuration for the gateway API.

use std::sync::Arc;

use axum::routing::{get, post, Router};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_check, receive_alert};
use crate::state::GatewayState;

/// Create the gateway router.
pub fn create_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/sms", post(receive_alert))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
