use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::handler::{WebhookHandler, await_handler};
use crate::rejection::Rejection;
use crate::secret::Secret;
use crate::signature::verify_signature;
use crate::types::WebhookEvent;

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";

/// Receives webhook deliveries, optionally checking their HMAC signature.
#[derive(Clone)]
pub struct WebhookGate {
    handler: Arc<dyn WebhookHandler>,
    secret: Secret,
    verification: bool,
    handler_timeout: Option<Duration>,
    timestamp_tolerance: Option<Duration>,
}

impl WebhookGate {
    pub fn new(handler: impl WebhookHandler, secret: Secret, verification: bool) -> Self {
        if verification && secret.is_empty() {
            tracing::warn!("webhook verification enabled with an empty signing secret");
        }
        Self {
            handler: Arc::new(handler),
            secret,
            verification,
            handler_timeout: None,
            timestamp_tolerance: None,
        }
    }

    #[must_use]
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Reject signed requests whose `x-timestamp` (Unix seconds) is further
    /// than `tolerance` from the local clock. Only applies with verification.
    #[must_use]
    pub fn with_timestamp_tolerance(mut self, tolerance: Option<Duration>) -> Self {
        self.timestamp_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn verification(&self) -> bool {
        self.verification
    }

    /// Run the gate over one request: 200 when the handler acknowledges the
    /// event, 400 for anything else.
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Response {
        match self.try_handle(headers, body).await {
            Ok(()) => StatusCode::OK.into_response(),
            Err(rejection) => {
                if matches!(rejection, Rejection::BadSignature) {
                    tracing::warn!("webhook signature mismatch");
                } else {
                    tracing::debug!(%rejection, "webhook gate rejected request");
                }
                rejection.into_response()
            }
        }
    }

    async fn try_handle(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), Rejection> {
        let signed = if self.verification {
            let signature = header_str(headers, SIGNATURE_HEADER);
            let timestamp = header_str(headers, TIMESTAMP_HEADER);
            match (signature, timestamp) {
                (Some(sig), Some(ts)) => Some((sig, ts)),
                _ => return Err(Rejection::MissingSignature),
            }
        } else {
            None
        };

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Rejection::MalformedBody(format!("invalid JSON: {e}")))?;

        if let Some((signature, timestamp)) = signed {
            self.check_timestamp(timestamp)?;
            // Signed form is the compact re-serialization with key order preserved.
            let canonical = serde_json::to_string(&value)
                .map_err(|e| Rejection::MalformedBody(e.to_string()))?;
            if !verify_signature(&canonical, timestamp, signature, self.secret.expose()) {
                return Err(Rejection::BadSignature);
            }
        }

        let event = WebhookEvent::from_value(value)?;
        let name = event.event.clone();
        let ack = await_handler(self.handler.handle(event), self.handler_timeout).await?;
        tracing::debug!(event = %name, ack, "webhook handled");

        if ack { Ok(()) } else { Err(Rejection::Declined) }
    }

    fn check_timestamp(&self, timestamp: &str) -> Result<(), Rejection> {
        let Some(tolerance) = self.timestamp_tolerance else {
            return Ok(());
        };
        let ts = timestamp
            .parse::<i64>()
            .map_err(|_| Rejection::StaleTimestamp)?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().cast_signed())
            .unwrap_or(0);
        if now.abs_diff(ts) > tolerance.as_secs() {
            return Err(Rejection::StaleTimestamp);
        }
        Ok(())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}
