use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Why a gate refused a request. Every variant maps to a bodiless response.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("missing bearer token")]
    MissingToken,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid session request: {0}")]
    InvalidSession(String),
    #[error("missing signature or timestamp header")]
    MissingSignature,
    #[error("signature mismatch")]
    BadSignature,
    #[error("timestamp outside tolerance window")]
    StaleTimestamp,
    #[error("malformed webhook body: {0}")]
    MalformedBody(String),
    #[error("handler declined the event")]
    Declined,
    #[error("handler returned invalid status {0}")]
    InvalidStatus(u16),
    #[error("handler did not finish in time")]
    HandlerTimeout,
}

impl Rejection {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::FORBIDDEN,
            Self::MissingField(_) | Self::InvalidSession(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MissingSignature
            | Self::BadSignature
            | Self::StaleTimestamp
            | Self::MalformedBody(_)
            | Self::Declined => StatusCode::BAD_REQUEST,
            Self::InvalidStatus(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::HandlerTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}
