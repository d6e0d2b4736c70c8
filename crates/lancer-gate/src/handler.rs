use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::rejection::Rejection;
use crate::types::{AuthRequest, AuthResult, WebhookEvent};

pub type HandlerFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Resolves which owner an upload session belongs to.
///
/// Implemented for any `Fn(AuthRequest) -> impl Future<Output = AuthResult>`.
pub trait AuthHandler: Send + Sync + 'static {
    fn authorize(&self, request: AuthRequest) -> HandlerFuture<AuthResult>;
}

impl<F, Fut> AuthHandler for F
where
    F: Fn(AuthRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AuthResult> + Send + 'static,
{
    fn authorize(&self, request: AuthRequest) -> HandlerFuture<AuthResult> {
        Box::pin(self(request))
    }
}

/// Processes a webhook event and acknowledges it with `true` or `false`.
pub trait WebhookHandler: Send + Sync + 'static {
    fn handle(&self, event: WebhookEvent) -> HandlerFuture<bool>;
}

impl<F, Fut> WebhookHandler for F
where
    F: Fn(WebhookEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    fn handle(&self, event: WebhookEvent) -> HandlerFuture<bool> {
        Box::pin(self(event))
    }
}

pub(crate) async fn await_handler<T>(
    fut: HandlerFuture<T>,
    timeout: Option<Duration>,
) -> Result<T, Rejection> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            tracing::warn!(timeout = ?limit, "gate handler timed out");
            Rejection::HandlerTimeout
        }),
        None => Ok(fut.await),
    }
}
