use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::GateConfig;
use crate::error::GateError;
use crate::gatekeeper::Gatekeeper;
use crate::handler::{AuthHandler, WebhookHandler};

/// Mount both gates at the configured paths.
///
/// Bodies larger than `max_body_size` are answered with 413 before any gate
/// runs. axum's own default extractor limit is lifted so `max_body_size` is
/// the only cap.
///
/// # Errors
///
/// Returns [`GateError::Config`] when `config` fails [`GateConfig::validate`].
pub fn build_router(
    gatekeeper: &Gatekeeper,
    config: &GateConfig,
    auth_handler: impl AuthHandler,
    webhook_handler: impl WebhookHandler,
) -> Result<Router, GateError> {
    config.validate()?;

    Ok(Router::new()
        .route(&config.auth_path, gatekeeper.auth(auth_handler))
        .route(
            &config.webhook_path,
            gatekeeper.webhook(webhook_handler, config.webhook_verification),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(TraceLayer::new_for_http()))
}
