use std::time::Duration;

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::routing::{MethodRouter, post};

use crate::auth::SessionAuthGate;
use crate::config::GateConfig;
use crate::error::GateError;
use crate::handler::{AuthHandler, WebhookHandler};
use crate::secret::Secret;
use crate::webhook::WebhookGate;

/// Factory for the session auth gate and the webhook gate, configured once
/// with the signing secret shared with webhook senders.
#[derive(Clone, Debug)]
pub struct Gatekeeper {
    signing_secret: Secret,
    handler_timeout: Option<Duration>,
    timestamp_tolerance: Option<Duration>,
}

impl Gatekeeper {
    pub fn new(signing_secret: impl Into<Secret>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            handler_timeout: None,
            timestamp_tolerance: None,
        }
    }

    /// Build a gatekeeper from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Config`] when [`GateConfig::validate`] fails: webhook
    /// verification without a signing secret, a route path not starting with
    /// `/`, equal auth and webhook paths, or a zero `max_body_size`.
    pub fn from_config(config: &GateConfig) -> Result<Self, GateError> {
        config.validate()?;
        let secret = config
            .signing_secret
            .clone()
            .unwrap_or_else(|| Secret::new(String::new()));
        Ok(Self::new(secret)
            .with_handler_timeout(config.handler_timeout_secs.map(Duration::from_secs))
            .with_timestamp_tolerance(config.timestamp_tolerance_secs.map(Duration::from_secs)))
    }

    /// Bound how long a caller handler may run before the gate answers 504.
    #[must_use]
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_timestamp_tolerance(mut self, tolerance: Option<Duration>) -> Self {
        self.timestamp_tolerance = tolerance;
        self
    }

    pub fn auth_gate(&self, handler: impl AuthHandler) -> SessionAuthGate {
        SessionAuthGate::new(handler).with_handler_timeout(self.handler_timeout)
    }

    pub fn webhook_gate(&self, handler: impl WebhookHandler, verification: bool) -> WebhookGate {
        WebhookGate::new(handler, self.signing_secret.clone(), verification)
            .with_handler_timeout(self.handler_timeout)
            .with_timestamp_tolerance(self.timestamp_tolerance)
    }

    /// `POST` route running the session auth gate.
    pub fn auth<S>(&self, handler: impl AuthHandler) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let gate = self.auth_gate(handler);
        post(move |headers: HeaderMap, body: Bytes| async move {
            gate.handle(&headers, &body).await
        })
    }

    /// `POST` route running the webhook gate. With `verification` off the
    /// signature headers are not inspected at all.
    pub fn webhook<S>(&self, handler: impl WebhookHandler, verification: bool) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let gate = self.webhook_gate(handler, verification);
        post(move |headers: HeaderMap, body: Bytes| async move {
            gate.handle(&headers, &body).await
        })
    }
}
