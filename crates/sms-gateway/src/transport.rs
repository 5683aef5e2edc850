//! HTTP transport for the outbound SMS API.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use sms_alerts::{GatewayError, SmsTransport};
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Request body accepted by the SMS API.
#[derive(Debug, Serialize)]
struct SmsRequest<'a> {
    mobile: &'a str,
    content: &'a str,
}

/// Posts `{"mobile", "content"}` JSON to a fixed URL, one request per address.
///
/// Any non-2xx response counts as a failed send.
#[derive(Debug, Clone)]
pub struct HttpSmsTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpSmsTransport {
    /// Creates a transport posting to `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Internal` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> ServerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The endpoint messages are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SmsTransport for HttpSmsTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn send<'a>(&'a self, address: &'a str, text: &'a str) -> BoxFuture<'a, sms_alerts::Result<()>> {
        Box::pin(async move {
            let failed = |reason: String| GatewayError::Delivery {
                address: address.to_string(),
                reason,
            };

            let response = self
                .client
                .post(&self.url)
                .json(&SmsRequest {
                    mobile: address,
                    content: text,
                })
                .send()
                .await
                .map_err(|e| failed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(failed(format!("SMS API returned {status}: {body}")));
            }

            debug!(address, status = status.as_u16(), "SMS accepted");
            Ok(())
        })
    }
}
