use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rejection::Rejection;

/// Fields an upload-session request must carry with a truthy value.
pub const REQUIRED_SESSION_FIELDS: [&str; 6] = [
    "chunk_size",
    "file_name",
    "file_size",
    "max_chunk",
    "mime_type",
    "provider",
];

/// Body of an upload-session creation request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionRequest {
    pub chunk_size: u64,
    pub file_name: String,
    pub file_size: u64,
    pub max_chunk: u64,
    pub mime_type: String,
    pub provider: String,
    /// Any further fields the client sent, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRequest {
    /// Parse and validate a raw JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::MissingField`] when a required field is absent or
    /// falsy (`null`, `false`, `0`, `""`), and [`Rejection::InvalidSession`]
    /// when the body is not a JSON object or a field has the wrong type.
    pub fn from_slice(body: &[u8]) -> Result<Self, Rejection> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Rejection::InvalidSession(format!("invalid JSON: {e}")))?;
        let Value::Object(fields) = value else {
            return Err(Rejection::InvalidSession("body is not a JSON object".into()));
        };

        if let Some(missing) = REQUIRED_SESSION_FIELDS
            .into_iter()
            .find(|name| !fields.get(*name).is_some_and(is_truthy))
        {
            return Err(Rejection::MissingField(missing));
        }

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| Rejection::InvalidSession(e.to_string()))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Input handed to an [`AuthHandler`](crate::AuthHandler).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthRequest {
    /// Bearer token exactly as the client sent it; validating it is up to the handler.
    pub token: String,
    pub session: SessionRequest,
}

/// Outcome of ownership resolution.
///
/// `status` becomes the response status; `owner_id` is echoed as
/// `{"ownerId": ...}` when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub owner_id: Option<String>,
    pub status: u16,
}

impl AuthResult {
    #[must_use]
    pub fn owned(owner_id: impl Into<String>, status: u16) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            status,
        }
    }

    #[must_use]
    pub fn denied(status: u16) -> Self {
        Self {
            owner_id: None,
            status,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct OwnerBody<'a> {
    #[serde(rename = "ownerId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<&'a str>,
}

/// A webhook delivery: the event name and its `data` record.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event: String,
    /// Session-like or file-like record, forwarded verbatim.
    pub payload: Value,
}

impl WebhookEvent {
    /// Extract `event` and `data` from a parsed webhook body.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::MalformedBody`] when the body is not an object or
    /// `event` is not a string. A missing `data` becomes `null`.
    pub fn from_value(body: Value) -> Result<Self, Rejection> {
        let Value::Object(mut fields) = body else {
            return Err(Rejection::MalformedBody("body is not a JSON object".into()));
        };
        let event = match fields.remove("event") {
            Some(Value::String(event)) => event,
            _ => return Err(Rejection::MalformedBody("missing string field `event`".into())),
        };
        let payload = fields.remove("data").unwrap_or(Value::Null);
        Ok(Self { event, payload })
    }

    /// Decode the payload into a caller-defined record type.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when the payload does not match `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
