use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::handler::{AuthHandler, await_handler};
use crate::rejection::Rejection;
use crate::types::{AuthRequest, OwnerBody, SessionRequest};

/// Validates upload-session requests and delegates ownership resolution.
#[derive(Clone)]
pub struct SessionAuthGate {
    handler: Arc<dyn AuthHandler>,
    handler_timeout: Option<Duration>,
}

impl SessionAuthGate {
    pub fn new(handler: impl AuthHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            handler_timeout: None,
        }
    }

    #[must_use]
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Run the gate over one request.
    ///
    /// 403 without a bearer token, 422 when the session body is incomplete,
    /// otherwise the handler's status with `{"ownerId": ...}`.
    pub async fn handle(&self, headers: &HeaderMap, body: &[u8]) -> Response {
        match self.try_handle(headers, body).await {
            Ok(resp) => resp,
            Err(rejection) => {
                tracing::debug!(%rejection, "auth gate rejected request");
                rejection.into_response()
            }
        }
    }

    async fn try_handle(&self, headers: &HeaderMap, body: &[u8]) -> Result<Response, Rejection> {
        let token = bearer_token(headers).ok_or(Rejection::MissingToken)?;
        let session = SessionRequest::from_slice(body)?;

        let request = AuthRequest {
            token: token.to_owned(),
            session,
        };
        let result = await_handler(self.handler.authorize(request), self.handler_timeout).await?;

        let status = StatusCode::from_u16(result.status).map_err(|_| {
            tracing::warn!(status = result.status, "auth handler returned invalid status");
            Rejection::InvalidStatus(result.status)
        })?;
        let body = OwnerBody {
            owner_id: result.owner_id.as_deref(),
        };
        Ok((status, Json(body)).into_response())
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let mut words = v.split(' ');
            match (words.next(), words.next()) {
                (Some("Bearer"), Some(token)) if !token.is_empty() => Some(token),
                _ => None,
            }
        })
}
